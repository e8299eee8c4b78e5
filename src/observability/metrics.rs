//! Metrics collection and exposition.
//!
//! # Metrics
//! - `feeds_requests_total` (counter): resolved requests by provider, outcome
//! - `feeds_upstream_requests_total` (counter): upstream attempts by provider, status
//! - `feeds_upstream_duration_seconds` (histogram): upstream attempt latency
//! - `feeds_cache_writes_total` (counter): successful cache refreshes by provider
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade, so it costs nothing when no
//!   exporter is installed (tests, metrics disabled)
//! - Labels are static strings; keys never become label values

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus exporter with its own HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe();
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn describe() {
    ::metrics::describe_counter!("feeds_requests_total", "Feed requests by provider and outcome");
    ::metrics::describe_counter!(
        "feeds_upstream_requests_total",
        "Upstream HTTP attempts by provider and status"
    );
    ::metrics::describe_histogram!(
        "feeds_upstream_duration_seconds",
        ::metrics::Unit::Seconds,
        "Latency of upstream HTTP attempts"
    );
    ::metrics::describe_counter!("feeds_cache_writes_total", "Cache refreshes by provider");
}

/// One resolved feed request.
pub fn record_request(provider: &'static str, outcome: &'static str) {
    ::metrics::counter!("feeds_requests_total", "provider" => provider, "outcome" => outcome)
        .increment(1);
}

/// One upstream HTTP attempt. `status` is the status code or an error class.
pub fn record_upstream(provider: &'static str, status: String, elapsed: Duration) {
    ::metrics::counter!("feeds_upstream_requests_total", "provider" => provider, "status" => status)
        .increment(1);
    ::metrics::histogram!("feeds_upstream_duration_seconds", "provider" => provider)
        .record(elapsed.as_secs_f64());
}

pub fn record_cache_write(provider: &'static str) {
    ::metrics::counter!("feeds_cache_writes_total", "provider" => provider).increment(1);
}
