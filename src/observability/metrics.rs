//! Metrics collection and exposition.
//!
//! # Metrics
//! - `todo_http_requests_total` (counter): requests by method, status
//! - `todo_http_request_duration_seconds` (histogram): latency by method
//! - `todo_rate_limited_total` (counter): rejected by the rate limiter
//! - `todo_suspicious_input_total` (counter): suspicious input by source
//! - `todo_store_operations_total` (counter): gateway calls by operation, outcome
//!
//! # Design Decisions
//! - The exporter is optional; without it every call below is a no-op
//! - Labels are bounded sets (methods, status codes, fixed names)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "todo_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("todo_http_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a request rejected by the rate limiter.
pub fn record_rate_limited() {
    metrics::counter!("todo_rate_limited_total").increment(1);
}

/// Record suspicious input found in `source` (path, query, headers, body).
pub fn record_suspicious_input(source: &'static str) {
    metrics::counter!("todo_suspicious_input_total", "source" => source).increment(1);
}

/// Record a gateway operation outcome.
pub fn record_store_operation(operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        "todo_store_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}
