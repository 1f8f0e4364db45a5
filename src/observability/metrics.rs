//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): completed exchanges by method, status
//! - `http_request_duration_seconds` (histogram): handling latency
//! - `http_active_connections` (gauge): current connection count
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    ::metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn set_active_connections(count: u64) {
    ::metrics::gauge!("http_active_connections").set(count as f64);
}
