//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts in 1..=one day, ports valid)
//! - Check that CORS entries are usable as header values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderName, Method};
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// Upper bound for every timeout setting (one day).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// A single semantic problem in a [`ProxyConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be zero")]
    Zero { field: &'static str },

    #[error("{field} must be at most {max} seconds")]
    TooLarge { field: &'static str, max: u64 },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("path {field} `{value}` must start with '/' and must not end with '/'")]
    BadPath { field: &'static str, value: String },

    #[error("allowed origin `{0}` must be scheme://host[:port] without a trailing '/'")]
    BadOrigin(String),

    #[error("app scheme `{0}` must end with \"://\"")]
    BadScheme(String),

    #[error("`{0}` is not a valid HTTP method")]
    BadMethod(String),

    #[error("`{0}` is not a valid header name")]
    BadHeader(String),

    #[error("metrics address `{0}` is not a socket address")]
    BadMetricsAddress(String),
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::Zero { field: "listener.port" });
    }
    check_path(&mut errors, "listener.health_path", &config.listener.health_path);
    check_path(&mut errors, "route.path_prefix", &config.route.path_prefix);

    if config.backend.host.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "backend.host" });
    }
    if config.backend.port == 0 {
        errors.push(ValidationError::Zero { field: "backend.port" });
    }

    check_timeout(&mut errors, "timeouts.connect_secs", config.timeouts.connect_secs);
    check_timeout(&mut errors, "timeouts.request_secs", config.timeouts.request_secs);
    check_timeout(&mut errors, "probe.timeout_secs", config.probe.timeout_secs);

    let cors = &config.cors;
    for origin in &cors.allowed_origins {
        if !origin.contains("://") || origin.ends_with('/') {
            errors.push(ValidationError::BadOrigin(origin.clone()));
        }
    }
    for prefix in &cors.private_network_prefixes {
        if prefix.is_empty() {
            errors.push(ValidationError::Empty {
                field: "cors.private_network_prefixes",
            });
        }
    }
    for scheme in &cors.app_schemes {
        if scheme.len() <= 3 || !scheme.ends_with("://") {
            errors.push(ValidationError::BadScheme(scheme.clone()));
        }
    }
    for method in &cors.allowed_methods {
        if method.parse::<Method>().is_err() {
            errors.push(ValidationError::BadMethod(method.clone()));
        }
    }
    for header in &cors.allowed_headers {
        if header.parse::<HeaderName>().is_err() {
            errors.push(ValidationError::BadHeader(header.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::BadMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_timeout(errors: &mut Vec<ValidationError>, field: &'static str, secs: u64) {
    if secs == 0 {
        errors.push(ValidationError::Zero { field });
    } else if secs > MAX_TIMEOUT_SECS {
        errors.push(ValidationError::TooLarge {
            field,
            max: MAX_TIMEOUT_SECS,
        });
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') || value.len() < 2 || value.ends_with('/') {
        errors.push(ValidationError::BadPath {
            field,
            value: value.to_string(),
        });
    }
}
