//! GitHub client error types.

use drift_repair::BoundaryError;

/// Errors from GitHub REST calls.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// GitHub returned a non-2xx status.
    #[error("GitHub {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// File contents could not be decoded.
    #[error("cannot decode contents of {path}: {reason}")]
    Decode { path: String, reason: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl GithubError {
    /// Map onto the collaborator error taxonomy for `operation`.
    pub fn into_boundary(self, operation: &str) -> BoundaryError {
        let operation = operation.to_string();
        let reason = self.to_string();
        match &self {
            Self::Http { .. } => BoundaryError::Unavailable { operation, reason },
            Self::Api { status: 409, .. } => BoundaryError::Conflict { operation, reason },
            Self::Api { status, .. } if *status >= 500 => {
                BoundaryError::Unavailable { operation, reason }
            }
            Self::Api { .. } => BoundaryError::Rejected { operation, reason },
            Self::Deserialization { .. } | Self::Decode { .. } => {
                BoundaryError::Io { operation, reason }
            }
            Self::Config(_) => BoundaryError::Unavailable { operation, reason },
        }
    }
}
