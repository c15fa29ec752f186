//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric definitions (counters, histograms)
//! - A request-timing middleware keyed by matched route
//! - Helpers for the focus-session counters

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

use focusflow_core::SessionType;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// This should be called once at application startup, before any metrics are recorded.
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("Failed to set global metrics recorder (already set)");
        return false;
    }

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Failed to store Prometheus handle (already set)");
    }

    describe_metrics();

    tracing::info!("Prometheus metrics initialized");
    true
}

fn describe_metrics() {
    describe_counter!("focusflow_requests_total", "Total number of API requests");
    describe_histogram!(
        "focusflow_request_duration_seconds",
        "Duration of API requests in seconds"
    );
    describe_counter!("focusflow_sessions_started_total", "Focus/break sessions started");
    describe_counter!("focusflow_sessions_ended_total", "Focus/break sessions ended");
    describe_counter!(
        "focusflow_sessions_merged_total",
        "Session rows removed by contiguous merges"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Record a completed API request.
///
/// # Arguments
/// * `endpoint` - Matched route template (e.g., "/api/tasks/{id}")
/// * `status` - HTTP status code as string (e.g., "200", "404", "500")
/// * `duration` - Request duration
pub fn record_request(endpoint: &str, status: &str, duration: std::time::Duration) {
    counter!("focusflow_requests_total", "endpoint" => endpoint.to_string(), "status" => status.to_string())
        .increment(1);
    histogram!("focusflow_request_duration_seconds", "endpoint" => endpoint.to_string())
        .record(duration.as_secs_f64());
}

pub fn record_session_started(session_type: SessionType) {
    counter!("focusflow_sessions_started_total", "type" => session_type.as_str()).increment(1);
}

pub fn record_session_ended(session_type: SessionType) {
    counter!("focusflow_sessions_ended_total", "type" => session_type.as_str()).increment(1);
}

pub fn record_merge(removed: u32) {
    counter!("focusflow_sessions_merged_total").increment(u64::from(removed));
}

/// Middleware timing every routed request. Labels use the route template,
/// not the raw path, so IDs don't explode cardinality.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();
    let response = next.run(req).await;
    record_request(&endpoint, response.status().as_str(), start.elapsed());
    response
}
