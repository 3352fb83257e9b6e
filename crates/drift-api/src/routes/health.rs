//! Health probes and the Prometheus scrape endpoint.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/metrics", get(prometheus_metrics))
}

/// GET /health/liveness
async fn liveness() -> &'static str {
    "ok"
}

/// GET /metrics — Prometheus text exposition format.
async fn prometheus_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| AppError::NotFound("metrics recorder not installed".into()))?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], handle.render()))
}
