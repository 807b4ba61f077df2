//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, service
//! - `gateway_request_duration_seconds` (histogram): latency by service
//! - `gateway_throttled_total` (counter): rate-limit denials by key class
//! - `gateway_auth_rejected_total` (counter): auth failures by reason
//! - `gateway_breaker_transitions_total` (counter): transitions by service, state
//! - `gateway_breaker_rejected_total` (counter): fast-fails by service
//! - `gateway_throttle_keys` (gauge): tracked client keys

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, service: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "service" => service.to_string(),
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "service" => service.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a rate-limit denial. `key_class` is "user" or "ip".
pub fn record_rate_limited(key_class: &str) {
    counter!("gateway_throttled_total", "key_class" => key_class.to_string()).increment(1);
}

/// Record an authentication rejection.
pub fn record_auth_rejected(reason: &'static str) {
    counter!("gateway_auth_rejected_total", "reason" => reason).increment(1);
}

/// Record a breaker state transition.
pub fn record_breaker_transition(service: &str, to: &'static str) {
    counter!(
        "gateway_breaker_transitions_total",
        "service" => service.to_string(),
        "state" => to,
    )
    .increment(1);
}

/// Record a call rejected by an open breaker (no downstream attempt).
pub fn record_breaker_rejected(service: &str) {
    counter!("gateway_breaker_rejected_total", "service" => service.to_string()).increment(1);
}

/// Track the size of the throttle key table.
pub fn record_throttle_table_size(keys: usize) {
    gauge!("gateway_throttle_keys").set(keys as f64);
}
