//! # Webhook Receiver
//!
//! `POST /webhook`: one delivery, one pipeline run.
//!
//! | Check | Failure |
//! |-------|---------|
//! | `X-Hub-Signature-256` matches (when a secret is configured) | 401 |
//! | `X-GitHub-Event` present | 400 |
//! | body is JSON | 422 |
//!
//! The pipeline outcome is returned as JSON with status 200. Pipeline
//! failures map through [`AppError`].

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use drift_core::Event;
use drift_repair::EventOutcome;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::signature;
use crate::state::AppState;

const EVENT_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";
const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Response body for a processed delivery.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// `event` or `event.action`.
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<String>,
    #[serde(flatten)]
    pub outcome: EventOutcome,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(receive))
}

async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, AppError> {
    if let Some(secret) = &state.webhook_secret {
        let provided = header_str(&headers, SIGNATURE_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("missing {SIGNATURE_HEADER} header")))?;
        if !signature::verify(secret.as_bytes(), &body, provided) {
            return Err(AppError::Unauthorized("signature mismatch".into()));
        }
    }

    let name = header_str(&headers, EVENT_HEADER)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("missing {EVENT_HEADER} header")))?;
    let delivery = header_str(&headers, DELIVERY_HEADER).map(str::to_string);

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::Unprocessable(format!("body is not JSON: {e}")))?;

    let event = Event::new(name, payload);
    tracing::debug!(event = %event.label(), delivery = ?delivery, "delivery received");
    let outcome = state.pipeline.handle(&event).await?;

    Ok(Json(WebhookResponse {
        event: event.label(),
        delivery,
        outcome,
    }))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
