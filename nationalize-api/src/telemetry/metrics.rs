//! Prometheus Metrics Definitions
//!
//! Defines all nationalize metrics with appropriate labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<NationalizeMetrics>> = Lazy::new(NationalizeMetrics::new);

/// Container for all nationalize metrics.
#[derive(Clone)]
pub struct NationalizeMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Resolved reads - labels: source (cache, store, external)
    pub resolutions_total: CounterVec,

    /// Calls to the nationality API - labels: status (HTTP code, timeout, transport_error)
    pub upstream_requests_total: CounterVec,

    /// Cache operations - labels: operation, result (hit/miss/error for get, ok/error otherwise)
    pub cache_operations_total: CounterVec,
}

impl NationalizeMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "nationalize_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_requests_total: {}", e)))?,

            http_request_duration_seconds: register_histogram_vec!(
                "nationalize_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_request_duration_seconds: {}", e)))?,

            resolutions_total: register_counter_vec!(
                "nationalize_resolutions_total",
                "Name lookups by the tier that served them",
                &["source"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register resolutions_total: {}", e)))?,

            upstream_requests_total: register_counter_vec!(
                "nationalize_upstream_requests_total",
                "Requests sent to the nationality API",
                &["status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register upstream_requests_total: {}", e)))?,

            cache_operations_total: register_counter_vec!(
                "nationalize_cache_operations_total",
                "Cache operations by outcome",
                &["operation", "result"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register cache_operations_total: {}", e)))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_resolution(&self, source: &str) {
        self.resolutions_total.with_label_values(&[source]).inc();
    }

    pub fn record_upstream_request(&self, status: &str) {
        self.upstream_requests_total
            .with_label_values(&[status])
            .inc();
    }

    /// Record a cache operation, e.g. ("get", "miss") or ("delete", "error").
    pub fn record_cache_operation(&self, operation: &str, result: &str) {
        self.cache_operations_total
            .with_label_values(&[operation, result])
            .inc();
    }
}

/// Run `f` against the global metrics, if they registered.
pub fn with_metrics(f: impl FnOnce(&NationalizeMetrics)) {
    if let Ok(metrics) = METRICS.as_ref() {
        f(metrics);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
))]
pub async fn metrics_handler() -> impl IntoResponse {
    // Force registration so a fresh process still exposes the families.
    if let Err(e) = METRICS.as_ref() {
        tracing::error!(error = %e, "Metrics registration failed");
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
