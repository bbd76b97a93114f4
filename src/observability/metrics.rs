//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method and status
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//!
//! Recording is a no-op until an exporter is installed, so the engine can
//! always call in regardless of configuration.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "failed to install metrics exporter")
        }
    }
}

/// Record one completed (or failed) proxied request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
