//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by route, status
//! - `proxy_request_duration_seconds` (histogram): time to response headers
//! - `proxy_upstream_failures_total` (counter): forward failures by kind
//! - `proxy_history_errors_total` (counter): swallowed history store errors
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_failure(route: &'static str, kind: &'static str) {
    counter!("proxy_upstream_failures_total", "route" => route, "kind" => kind).increment(1);
}

pub fn record_history_error(operation: &'static str) {
    counter!("proxy_history_errors_total", "operation" => operation).increment(1);
}
