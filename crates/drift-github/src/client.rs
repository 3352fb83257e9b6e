//! Typed client for the GitHub REST endpoints the collaborators need.
//!
//! ## Endpoints
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/repos/{owner}/{repo}/contents/{path}?ref={branch}` | Read file |
//! | PUT    | `/repos/{owner}/{repo}/contents/{path}` | Create or update file |
//! | GET    | `/repos/{owner}/{repo}/git/ref/heads/{branch}` | Read branch head |
//! | POST   | `/repos/{owner}/{repo}/git/refs` | Create branch |
//! | GET    | `/repos/{owner}/{repo}/pulls?head={owner}:{branch}&base={base}&state=open` | Find open pull request |
//! | POST   | `/repos/{owner}/{repo}/pulls` | Open pull request |
//! | POST   | `/repos/{owner}/{repo}/issues/{number}/labels` | Add labels |
//!
//! Requests are sent once. Retries are left to the caller.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, GithubConfig};
use crate::error::GithubError;

const API_VERSION: &str = "2022-11-28";

/// A file read from a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContents {
    /// Decoded UTF-8 text.
    pub text: String,
    /// Blob sha, required to update the file.
    pub sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Serialize)]
struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: &'a str,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CreatePullRequest<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
}

#[derive(Debug, Serialize)]
struct LabelsRequest<'a> {
    labels: &'a [String],
}

/// Client bound to one repository.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    owner: String,
    repo_url: String,
}

impl GithubClient {
    /// Create a client from configuration.
    pub fn new(config: &GithubConfig) -> Result<Self, GithubError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("schema-drift/", env!("CARGO_PKG_VERSION")))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.token))
                        .map_err(|_| GithubError::Config(ConfigError::MissingToken))?,
                );
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
                );
                headers.insert(
                    "X-GitHub-Api-Version",
                    reqwest::header::HeaderValue::from_static(API_VERSION),
                );
                headers
            })
            .build()
            .map_err(|e| GithubError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        let repo_url = format!(
            "{}/repos/{}/{}",
            config.api_url.as_str().trim_end_matches('/'),
            config.owner,
            config.repo
        );
        Ok(Self {
            http,
            owner: config.owner.clone(),
            repo_url,
        })
    }

    /// Read `path` on `branch`. `None` when either does not exist.
    pub async fn get_file(&self, path: &str, branch: &str) -> Result<Option<FileContents>, GithubError> {
        let endpoint = format!("GET /contents/{path}");
        let url = format!("{}/contents/{path}", self.repo_url);
        let request = self.http.get(&url).query(&[("ref", branch)]);
        let Some(resp) = send(request, &endpoint, true).await? else {
            return Ok(None);
        };
        let body: ContentResponse = resp.json().await.map_err(|e| GithubError::Deserialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        if body.encoding.as_deref().is_some_and(|enc| enc != "base64") {
            return Err(GithubError::Decode {
                path: path.to_string(),
                reason: format!("unsupported encoding {:?}", body.encoding),
            });
        }
        Ok(Some(FileContents {
            text: decode_content(path, &body.content)?,
            sha: body.sha,
        }))
    }

    /// Head commit sha of `branch`. `None` when the branch does not exist.
    pub async fn get_branch_sha(&self, branch: &str) -> Result<Option<String>, GithubError> {
        let endpoint = format!("GET /git/ref/heads/{branch}");
        let url = format!("{}/git/ref/heads/{branch}", self.repo_url);
        let Some(resp) = send(self.http.get(&url), &endpoint, true).await? else {
            return Ok(None);
        };
        let body: RefResponse = resp.json().await.map_err(|e| GithubError::Deserialization {
            endpoint,
            source: e,
        })?;
        Ok(Some(body.object.sha))
    }

    /// Create `branch` pointing at `sha`.
    pub async fn create_branch(&self, branch: &str, sha: &str) -> Result<(), GithubError> {
        let endpoint = "POST /git/refs";
        let url = format!("{}/git/refs", self.repo_url);
        let req = CreateRefRequest {
            git_ref: format!("refs/heads/{branch}"),
            sha,
        };
        send(self.http.post(&url).json(&req), endpoint, false).await?;
        Ok(())
    }

    /// Create or update `path` on `branch`. `sha` is the blob being
    /// replaced, `None` when creating the file.
    pub async fn put_file(
        &self,
        path: &str,
        branch: &str,
        message: &str,
        text: &str,
        sha: Option<&str>,
    ) -> Result<(), GithubError> {
        let endpoint = format!("PUT /contents/{path}");
        let url = format!("{}/contents/{path}", self.repo_url);
        let req = PutContentsRequest {
            message,
            content: STANDARD.encode(text.as_bytes()),
            branch,
            sha,
        };
        send(self.http.put(&url).json(&req), &endpoint, false).await?;
        Ok(())
    }

    /// Number of the open pull request from `head` into `base`, if any.
    pub async fn find_open_pull(&self, head: &str, base: &str) -> Result<Option<u64>, GithubError> {
        let endpoint = "GET /pulls";
        let url = format!("{}/pulls", self.repo_url);
        let head = format!("{}:{head}", self.owner);
        let request = self
            .http
            .get(&url)
            .query(&[("head", head.as_str()), ("base", base), ("state", "open")]);
        let Some(resp) = send(request, endpoint, true).await? else {
            return Ok(None);
        };
        let pulls: Vec<PullResponse> = resp.json().await.map_err(|e| GithubError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })?;
        Ok(pulls.first().map(|pull| pull.number))
    }

    /// Open a pull request; returns its number.
    pub async fn create_pull(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<u64, GithubError> {
        let endpoint = "POST /pulls";
        let url = format!("{}/pulls", self.repo_url);
        let req = CreatePullRequest {
            title,
            body,
            head,
            base,
        };
        let resp = send(self.http.post(&url).json(&req), endpoint, false)
            .await?
            .ok_or_else(|| not_found(endpoint))?;
        let pull: PullResponse = resp.json().await.map_err(|e| GithubError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })?;
        Ok(pull.number)
    }

    /// Add `labels` to issue or pull request `number`.
    pub async fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), GithubError> {
        let endpoint = format!("POST /issues/{number}/labels");
        let url = format!("{}/issues/{number}/labels", self.repo_url);
        send(self.http.post(&url).json(&LabelsRequest { labels }), &endpoint, false).await?;
        Ok(())
    }
}

/// Send a request. With `allow_missing`, a 404 yields `Ok(None)`;
/// otherwise every non-2xx is a [`GithubError::Api`].
async fn send(
    request: reqwest::RequestBuilder,
    endpoint: &str,
    allow_missing: bool,
) -> Result<Option<reqwest::Response>, GithubError> {
    let resp = request.send().await.map_err(|e| GithubError::Http {
        endpoint: endpoint.to_string(),
        source: e,
    })?;

    if allow_missing && resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(GithubError::Api {
            endpoint: endpoint.to_string(),
            status,
            body,
        });
    }
    Ok(Some(resp))
}

fn not_found(endpoint: &str) -> GithubError {
    GithubError::Api {
        endpoint: endpoint.to_string(),
        status: 404,
        body: String::new(),
    }
}

/// Contents come back as base64 wrapped at 60 columns.
fn decode_content(path: &str, content: &str) -> Result<String, GithubError> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| GithubError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| GithubError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}
