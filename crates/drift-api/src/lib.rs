//! # drift-api — Webhook Transport
//!
//! Receives event deliveries over HTTP and hands each one to the repair
//! pipeline.
//!
//! ## Routes
//!
//! - `POST /webhook`: verify, decode, run the pipeline, return the outcome
//! - `GET /health/liveness`: liveness probe
//! - `GET /metrics`: Prometheus scrape endpoint
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → DefaultBodyLimit (5 MiB) → Handler
//!
//! ## Crate Policy
//!
//! - No repair logic in route handlers; everything goes through
//!   `RepairPipeline::handle`.
//! - All errors map to structured HTTP responses via `AppError`.

pub mod error;
pub mod routes;
pub mod signature;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::{AppState, WebhookSecret};

/// Largest accepted delivery body.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::webhook::router())
        .merge(routes::health::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "listening for webhook deliveries");
    }
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
}
