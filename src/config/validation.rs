//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (unique service names and prefixes)
//! - Validate value ranges (thresholds, windows, timeouts)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address".into(),
            message: format!("not a valid socket address: {}", config.listener.bind_address),
        });
    }

    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError {
            field: "auth.jwt_secret".into(),
            message: "must not be empty".into(),
        });
    }

    let limits = [
        ("rate_limit.requests_per_minute", config.rate_limit.requests_per_minute),
        ("rate_limit.requests_per_hour", config.rate_limit.requests_per_hour),
        ("rate_limit.requests_per_day", config.rate_limit.requests_per_day),
    ];
    for (field, value) in limits {
        if value == 0 {
            errors.push(ValidationError {
                field: field.into(),
                message: "ceiling must be greater than zero".into(),
            });
        }
    }

    let mut names = HashSet::new();
    let mut prefixes = HashSet::new();
    for (i, service) in config.services.iter().enumerate() {
        let field = |suffix: &str| format!("services[{}].{}", i, suffix);

        if !names.insert(service.name.clone()) {
            errors.push(ValidationError {
                field: field("name"),
                message: format!("duplicate service name: {}", service.name),
            });
        }
        if !prefixes.insert(service.path_prefix.clone()) {
            errors.push(ValidationError {
                field: field("path_prefix"),
                message: format!("duplicate path prefix: {}", service.path_prefix),
            });
        }
        if service.path_prefix.is_empty() || service.path_prefix.contains('/') {
            errors.push(ValidationError {
                field: field("path_prefix"),
                message: "must be a single non-empty path segment".into(),
            });
        }
        if !(0.0..=100.0).contains(&service.failure_rate_threshold)
            || service.failure_rate_threshold == 0.0
        {
            errors.push(ValidationError {
                field: field("failure_rate_threshold"),
                message: "must be a percentage in (0, 100]".into(),
            });
        }
        if service.sliding_window_size == 0 {
            errors.push(ValidationError {
                field: field("sliding_window_size"),
                message: "must be greater than zero".into(),
            });
        }
        if service.minimum_calls == 0 || service.minimum_calls > service.sliding_window_size {
            errors.push(ValidationError {
                field: field("minimum_calls"),
                message: "must be in 1..=sliding_window_size".into(),
            });
        }
        if service.half_open_trial_count == 0 {
            errors.push(ValidationError {
                field: field("half_open_trial_count"),
                message: "must be greater than zero".into(),
            });
        }
        if service.timeout_secs == 0 {
            errors.push(ValidationError {
                field: field("timeout_secs"),
                message: "must be greater than zero".into(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
