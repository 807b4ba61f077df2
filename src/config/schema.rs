//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the API gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Token signing and public-route settings.
    pub auth: AuthConfig,

    /// Per-client rate limiting settings.
    pub rate_limit: RateLimitConfig,

    /// Downstream service definitions, one circuit breaker each.
    pub services: Vec<ServiceConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// Default configuration fronting the five banking services.
    ///
    /// `GatewayConfig::default()` leaves `services` empty; this fills in the
    /// standard deployment so tests and local runs work without a file.
    pub fn with_default_services() -> Self {
        Self {
            services: ServiceConfig::banking_defaults(),
            ..Self::default()
        }
    }

    /// Look up a service by the `/api/<prefix>` path segment it owns.
    pub fn service_for_prefix(&self, prefix: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.path_prefix == prefix)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HMAC secret for token signing (HS512).
    pub jwt_secret: String,

    /// Path prefixes that bypass authentication.
    pub public_route_prefixes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            jwt_secret: "defaultSecretKeyForBankingApplication2024".to_string(),
            public_route_prefixes: vec![
                "/api/users/register".to_string(),
                "/api/users/login".to_string(),
                "/api/users/forgot-password".to_string(),
                "/api/users".to_string(),
                "/api/accounts".to_string(),
                "/actuator".to_string(),
                "/health".to_string(),
                "/info".to_string(),
            ],
        }
    }
}

/// Rate limiting configuration.
///
/// Three independent fixed windows per client key, each with its own ceiling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per minute per client key.
    pub requests_per_minute: u32,

    /// Maximum requests per hour per client key.
    pub requests_per_hour: u32,

    /// Maximum requests per day per client key.
    pub requests_per_day: u32,

    /// Value of the Retry-After hint on throttled responses, in seconds.
    pub retry_after_secs: u64,

    /// How often idle client entries are swept, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            requests_per_hour: 1_000,
            requests_per_day: 10_000,
            retry_after_secs: 60,
            sweep_interval_secs: 600,
        }
    }
}

/// A downstream service fronted by the gateway.
///
/// Each service owns an independently configured circuit breaker and per-call
/// timeout, reflecting differing criticality and tolerance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service identifier for logging/metrics (e.g., "user-service").
    pub name: String,

    /// First path segment after /api this service owns (e.g., "users").
    pub path_prefix: String,

    /// Upstream address (e.g., "127.0.0.1:8081").
    pub address: String,

    /// Number of most recent call outcomes kept for failure-rate evaluation.
    #[serde(default = "default_sliding_window")]
    pub sliding_window_size: usize,

    /// Minimum recorded calls before the failure rate is evaluated.
    #[serde(default = "default_minimum_calls")]
    pub minimum_calls: usize,

    /// Failure rate (percent) at or above which the breaker opens.
    pub failure_rate_threshold: f32,

    /// How long the breaker stays open before probing, in seconds.
    pub open_duration_secs: u64,

    /// Probe calls admitted in half-open state.
    #[serde(default = "default_half_open_trials")]
    pub half_open_trial_count: usize,

    /// Per-call timeout for this service, in seconds.
    pub timeout_secs: u64,
}

fn default_sliding_window() -> usize {
    10
}

fn default_minimum_calls() -> usize {
    5
}

fn default_half_open_trials() -> usize {
    3
}

impl ServiceConfig {
    /// Per-call timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Open-state cool-down as a Duration.
    pub fn open_duration(&self) -> Duration {
        Duration::from_secs(self.open_duration_secs)
    }

    /// The standard five-service banking deployment.
    ///
    /// Payment is the most conservative (longest cool-down, lowest failure
    /// tolerance); notification the most tolerant with fastest recovery.
    pub fn banking_defaults() -> Vec<ServiceConfig> {
        let service = |name: &str, prefix: &str, address: &str, open_secs, threshold, timeout| {
            ServiceConfig {
                name: name.to_string(),
                path_prefix: prefix.to_string(),
                address: address.to_string(),
                sliding_window_size: default_sliding_window(),
                minimum_calls: default_minimum_calls(),
                failure_rate_threshold: threshold,
                open_duration_secs: open_secs,
                half_open_trial_count: default_half_open_trials(),
                timeout_secs: timeout,
            }
        };
        vec![
            service("user-service", "users", "127.0.0.1:8081", 20, 40.0, 8),
            service("account-service", "accounts", "127.0.0.1:8082", 25, 35.0, 12),
            service("transaction-service", "transactions", "127.0.0.1:8083", 30, 30.0, 15),
            service("payment-service", "payments", "127.0.0.1:8084", 40, 25.0, 20),
            service("notification-service", "notifications", "127.0.0.1:8085", 15, 60.0, 5),
        ]
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_services_cover_all_five_backends() {
        let config = GatewayConfig::with_default_services();
        assert_eq!(config.services.len(), 5);

        let payment = config.service_for_prefix("payments").unwrap();
        assert_eq!(payment.name, "payment-service");
        assert_eq!(payment.open_duration_secs, 40);
        assert_eq!(payment.failure_rate_threshold, 25.0);
        assert_eq!(payment.timeout_secs, 20);

        let notification = config.service_for_prefix("notifications").unwrap();
        assert_eq!(notification.open_duration_secs, 15);
        assert_eq!(notification.failure_rate_threshold, 60.0);
    }

    #[test]
    fn minimal_toml_fills_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9999"

            [[services]]
            name = "user-service"
            path_prefix = "users"
            address = "127.0.0.1:8081"
            failure_rate_threshold = 40.0
            open_duration_secs = 20
            timeout_secs = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert_eq!(config.rate_limit.requests_per_minute, 60);
        assert_eq!(config.services[0].sliding_window_size, 10);
        assert_eq!(config.services[0].minimum_calls, 5);
        assert_eq!(config.services[0].half_open_trial_count, 3);
    }
}
