//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_host_registrations_total` (counter): handlers registered
//! - `http_host_lifecycle_transitions_total` (counter): transitions by target state
//! - `http_host_requests_total` (counter): dispatched requests by route, status
//! - `http_host_request_duration_seconds` (histogram): dispatch latency by route

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::lifecycle::HostLifecycleState;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_registration() {
    metrics::counter!("http_host_registrations_total").increment(1);
}

pub fn record_transition(state: HostLifecycleState) {
    metrics::counter!("http_host_lifecycle_transitions_total", "state" => state.as_str()).increment(1);
}

/// Record a dispatched request; `route` is `"none"` when nothing matched.
pub fn record_request(route: &str, status: u16, start_time: Instant) {
    let route = if route.is_empty() { "/" } else { route }.to_string();
    metrics::counter!(
        "http_host_requests_total",
        "route" => route.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("http_host_request_duration_seconds", "route" => route)
        .record(start_time.elapsed().as_secs_f64());
}
