//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_sessions_started_total` (counter): sessions accepted, by role
//! - `relay_sessions_total` (counter): sessions ended, by role and outcome
//! - `relay_active_sessions` (gauge): current session count
//! - `relay_covert_bits_total` (counter): bits moved, by direction
//! - `relay_hidden_messages_total` (counter): complete hidden messages, by direction
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Direction of covert traffic relative to this relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Sent => "sent",
            Direction::Received => "received",
        }
    }
}

pub fn record_session_started(role: &'static str) {
    ::metrics::counter!("relay_sessions_started_total", "role" => role).increment(1);
}

pub fn record_session(role: &'static str, outcome: &'static str) {
    ::metrics::counter!("relay_sessions_total", "role" => role, "outcome" => outcome).increment(1);
}

pub fn set_active_sessions(count: u64) {
    ::metrics::gauge!("relay_active_sessions").set(count as f64);
}

pub fn record_bits(direction: Direction, bits: usize) {
    ::metrics::counter!("relay_covert_bits_total", "direction" => direction.as_str())
        .increment(bits as u64);
}

pub fn record_hidden_message(direction: Direction) {
    ::metrics::counter!("relay_hidden_messages_total", "direction" => direction.as_str())
        .increment(1);
}
