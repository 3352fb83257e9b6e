//! GitHub collaborator configuration.
//!
//! Defaults point at the `octokit/webhooks` repository's `schema.json` on
//! `master`. Override via environment variables or explicit construction
//! for other repositories and for testing.

use url::Url;

/// Configuration for the GitHub schema store and change proposer.
///
/// Custom `Debug` implementation redacts the `token` field.
#[derive(Clone)]
pub struct GithubConfig {
    /// REST API base URL. Default: <https://api.github.com>
    pub api_url: Url,
    /// Token sent as `Authorization: Bearer`.
    pub token: String,
    /// Owner of the schema repository.
    pub owner: String,
    /// Name of the schema repository.
    pub repo: String,
    /// Path of the schema file inside the repository.
    pub schema_path: String,
    /// Branch holding the reference schema.
    pub schema_branch: String,
    /// Commit message for repaired schema versions.
    pub commit_message: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_url", &self.api_url)
            .field("token", &"[REDACTED]")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("schema_path", &self.schema_path)
            .field("schema_branch", &self.schema_branch)
            .field("commit_message", &self.commit_message)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GithubConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `GITHUB_TOKEN` (required)
    /// - `GITHUB_API_URL` (default: `https://api.github.com`)
    /// - `DRIFT_SCHEMA_OWNER` (default: `octokit`)
    /// - `DRIFT_SCHEMA_REPO` (default: `webhooks`)
    /// - `DRIFT_SCHEMA_PATH` (default: `schema.json`)
    /// - `DRIFT_SCHEMA_BRANCH` (default: `master`)
    /// - `DRIFT_COMMIT_MESSAGE` (default: `Update schemas`)
    /// - `GITHUB_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;
        let mut config = Self::new(env_url("GITHUB_API_URL", "https://api.github.com")?, token);
        config.owner = env_or("DRIFT_SCHEMA_OWNER", &config.owner);
        config.repo = env_or("DRIFT_SCHEMA_REPO", &config.repo);
        config.schema_path = env_or("DRIFT_SCHEMA_PATH", &config.schema_path);
        config.schema_branch = env_or("DRIFT_SCHEMA_BRANCH", &config.schema_branch);
        config.commit_message = env_or("DRIFT_COMMIT_MESSAGE", &config.commit_message);
        config.timeout_secs = std::env::var("GITHUB_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.timeout_secs);
        Ok(config)
    }

    /// Configuration with default repository coordinates.
    pub fn new(api_url: Url, token: impl Into<String>) -> Self {
        Self {
            api_url,
            token: token.into(),
            owner: "octokit".to_string(),
            repo: "webhooks".to_string(),
            schema_path: "schema.json".to_string(),
            schema_branch: "master".to_string(),
            commit_message: "Update schemas".to_string(),
            timeout_secs: 30,
        }
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GITHUB_TOKEN environment variable is required")]
    MissingToken,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let cfg = GithubConfig::new(Url::parse("https://api.github.com").unwrap(), "ghp_secret");
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn defaults_target_webhooks_schema() {
        let cfg = GithubConfig::new(Url::parse("https://api.github.com").unwrap(), "t");
        assert_eq!(cfg.owner, "octokit");
        assert_eq!(cfg.repo, "webhooks");
        assert_eq!(cfg.schema_branch, "master");
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("DRIFT_NONEXISTENT_URL_VAR", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_or_uses_default_when_var_absent() {
        assert_eq!(env_or("DRIFT_NONEXISTENT_VAR", "fallback"), "fallback");
    }
}
