//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ext_proc_events_total` (counter): received events by phase
//! - `ext_proc_mode_overrides_total` (counter): overrides sent, by mode
//! - `ext_proc_send_failures_total` (counter): replies that could not be sent
//! - `ext_proc_streams_total` (counter): finished streams by outcome
//! - `ext_proc_active_streams` (gauge): streams currently open

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::processor::{ModeOverride, Phase};

/// Install the Prometheus recorder and its HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_event(phase: Option<Phase>) {
    let phase = phase.map(|p| p.as_str()).unwrap_or("unrecognized");
    metrics::counter!("ext_proc_events_total", "phase" => phase).increment(1);
}

pub fn record_mode_override(mode: &ModeOverride) {
    metrics::counter!(
        "ext_proc_mode_overrides_total",
        "header_mode" => mode.header_mode.as_str(),
        "body_mode" => mode.body_mode.as_str()
    )
    .increment(1);
}

pub fn record_send_failure() {
    metrics::counter!("ext_proc_send_failures_total").increment(1);
}

pub fn record_stream_finished(outcome: &'static str) {
    metrics::counter!("ext_proc_streams_total", "outcome" => outcome).increment(1);
}

pub fn stream_opened() {
    metrics::gauge!("ext_proc_active_streams").increment(1.0);
}

pub fn stream_closed() {
    metrics::gauge!("ext_proc_active_streams").decrement(1.0);
}
