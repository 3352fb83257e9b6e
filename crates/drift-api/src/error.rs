//! # Application Error
//!
//! Maps request and pipeline failures to structured HTTP responses with
//! proper status codes and error bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use drift_repair::RepairError;
use thiserror::Error;

/// Application-level error type that maps to HTTP responses.
#[derive(Error, Debug)]
pub enum AppError {
    /// The request is missing something the endpoint requires.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Signature missing or wrong.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The body or the reference schema could not be processed.
    #[error("unprocessable: {0}")]
    Unprocessable(String),

    /// A collaborator (schema store, change proposer) failed.
    #[error("upstream failure: {0}")]
    BadGateway(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepairError> for AppError {
    fn from(error: RepairError) -> Self {
        match error {
            RepairError::Engine(_) | RepairError::SchemaText(_) => {
                AppError::Unprocessable(error.to_string())
            }
            RepairError::Boundary(_) => AppError::BadGateway(error.to_string()),
            RepairError::Patch(_) | RepairError::Render(_) => AppError::Internal(error.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}
