//! Metrics collection and exposition.
//!
//! # Metrics
//! - `transport_connections_total` (counter): connections by direction
//! - `transport_active_connections` (gauge): live connection tasks
//! - `transport_accept_errors_total` (counter): failed accepts
//! - `transport_handshake_failures_total` (counter)
//! - `transport_peer_rejections_total` (counter): refused by the upper layer
//! - `transport_decode_errors_total` (counter): decode loops ended by an error
//! - `transport_messages_total` (counter): messages delivered to the channel

use std::net::SocketAddr;

/// Install the Prometheus exporter with an HTTP scrape endpoint on `addr`.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_connection(outbound: bool) {
    let direction = if outbound { "outbound" } else { "inbound" };
    metrics::counter!("transport_connections_total", "direction" => direction).increment(1);
}

pub fn set_active_connections(count: u64) {
    metrics::gauge!("transport_active_connections").set(count as f64);
}

pub fn record_accept_error() {
    metrics::counter!("transport_accept_errors_total").increment(1);
}

pub fn record_handshake_failure() {
    metrics::counter!("transport_handshake_failures_total").increment(1);
}

pub fn record_peer_rejected() {
    metrics::counter!("transport_peer_rejections_total").increment(1);
}

pub fn record_decode_error() {
    metrics::counter!("transport_decode_errors_total").increment(1);
}

pub fn record_message() {
    metrics::counter!("transport_messages_total").increment(1);
}
