//! # Application State
//!
//! Shared state for the Axum application: the repair pipeline, the
//! webhook secret, and the Prometheus handle.

use std::sync::Arc;

use drift_repair::RepairPipeline;
use metrics_exporter_prometheus::PrometheusHandle;

/// Webhook secret. `Debug` never prints the value.
#[derive(Clone)]
pub struct WebhookSecret(Arc<[u8]>);

impl WebhookSecret {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(Arc::from(secret.as_ref()))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret([REDACTED])")
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RepairPipeline>,
    /// When set, deliveries must carry a valid `X-Hub-Signature-256`.
    pub webhook_secret: Option<WebhookSecret>,
    /// Renders `/metrics`; `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pipeline", &self.pipeline)
            .field("webhook_secret", &self.webhook_secret)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl AppState {
    /// State without signature verification or metrics.
    pub fn new(pipeline: RepairPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            webhook_secret: None,
            metrics: None,
        }
    }

    pub fn with_webhook_secret(mut self, secret: WebhookSecret) -> Self {
        self.webhook_secret = Some(secret);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_redacted() {
        let secret = WebhookSecret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "WebhookSecret([REDACTED])");
        assert_eq!(secret.as_bytes(), b"hunter2");
    }
}
