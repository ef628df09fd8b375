//! Metrics collection and exposition.
//!
//! # Metrics
//! - `filter_proxy_requests_total` (counter): client requests by route, status
//! - `filter_proxy_request_duration_seconds` (histogram): end-to-end latency by route
//! - `filter_proxy_filter_calls_total` (counter): filter callouts by kind, outcome
//! - `filter_proxy_reloads_total` (counter): reload attempts by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "filter_proxy_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "filter_proxy_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_filter_call(kind: &str, outcome: &'static str) {
    ::metrics::counter!(
        "filter_proxy_filter_calls_total",
        "filter" => kind.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_reload(outcome: &'static str) {
    ::metrics::counter!("filter_proxy_reloads_total", "outcome" => outcome).increment(1);
}
