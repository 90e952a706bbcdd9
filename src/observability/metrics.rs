//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_bridge_polls_total` (counter): history entries by outcome
//! - `relay_bridge_relay_on` (gauge): 1=ON, 0=OFF
//! - `relay_bridge_poll_duration_seconds` (histogram): alert API latency
//! - `relay_bridge_device_errors_total` (counter): failed relay writes
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::history::OutcomeKind;
use crate::relay::RelayState;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics endpoint listening");
    Ok(())
}

pub fn record_poll_outcome(kind: OutcomeKind) {
    counter!("relay_bridge_polls_total", "outcome" => kind.as_str()).increment(1);
}

pub fn record_relay_state(state: RelayState) {
    gauge!("relay_bridge_relay_on").set(f64::from(state.level()));
}

pub fn record_poll_duration(start: Instant) {
    histogram!("relay_bridge_poll_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_device_error() {
    counter!("relay_bridge_device_errors_total").increment(1);
}
