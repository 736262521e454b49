//! Metrics collection and exposition.
//!
//! # Metrics
//! - `treasury_requests_total` (counter): API requests by route, status
//! - `treasury_request_duration_seconds` (histogram): API latency
//! - `treasury_settlements_total` (counter): settlement attempts by kind, outcome
//! - `treasury_confirmation_seconds` (histogram): broadcast → receipt latency
//! - `treasury_ledger_ops_total` (counter): ledger mutations by op
//! - `treasury_ledger_identities` (gauge): identities with a ledger entry
//! - `treasury_chain_healthy` (gauge): 1=reachable, 0=unreachable
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter, so
//! tests never need a recorder.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    counter!(
        "treasury_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("treasury_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_settlement(kind: &'static str, outcome: &'static str) {
    counter!("treasury_settlements_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_confirmation_latency(elapsed: Duration) {
    histogram!("treasury_confirmation_seconds").record(elapsed.as_secs_f64());
}

pub fn record_ledger_op(op: &'static str) {
    counter!("treasury_ledger_ops_total", "op" => op).increment(1);
}

pub fn record_ledger_identities(count: usize) {
    gauge!("treasury_ledger_identities").set(count as f64);
}

pub fn record_chain_health(healthy: bool) {
    gauge!("treasury_chain_healthy").set(if healthy { 1.0 } else { 0.0 });
}
