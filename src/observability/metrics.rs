//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forwarding_resolutions_total` (counter): resolved addresses by source
//! - `forwarding_scheme_total` (counter): effective TLS flag (`secure`)
//! - `http_requests_total` (counter): served requests by status
//! - `http_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - Prometheus exporter runs its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::forwarding::AddressSource;

/// Install the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_resolution(source: AddressSource) {
    counter!("forwarding_resolutions_total", "source" => source.as_str()).increment(1);
}

pub fn record_scheme(secure: bool) {
    let secure = if secure { "true" } else { "false" };
    counter!("forwarding_scheme_total", "secure" => secure).increment(1);
}

pub fn record_request(status: u16, start: Instant) {
    counter!("http_requests_total", "status" => status.to_string()).increment(1);
    histogram!("http_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
