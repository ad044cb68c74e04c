//! Prometheus metrics
//!
//! The recorder is installed once per process. Until then every
//! `metrics::*!` call is a no-op, which keeps tests free of global state.

use axum::{http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder (idempotent)
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
        .map(Clone::clone)
        .map_err(|e| tracing::warn!(error = %e, "Failed to install Prometheus recorder"))
        .ok()
}

/// Count a request to `endpoint`
pub fn record_request(endpoint: &'static str) {
    metrics::counter!("voice_support_requests_total", "endpoint" => endpoint).increment(1);
}

/// Count a failure of the given kind
pub fn record_error(kind: &'static str) {
    metrics::counter!("voice_support_errors_total", "kind" => kind).increment(1);
}

/// `GET /metrics`
pub async fn metrics_handler() -> impl IntoResponse {
    match HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
