//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {var}=`{value}` is invalid: {reason}")]
    Env {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    let config = apply_env_overrides(config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// List variables are comma separated; blank entries are dropped.
pub fn apply_env_overrides<F>(mut config: ProxyConfig, lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("PORT") {
        config.listener.port = parse_env("PORT", value)?;
    }
    if let Some(value) = lookup("BACKEND_HOST") {
        config.backend.host = value;
    }
    if let Some(value) = lookup("BACKEND_PORT") {
        config.backend.port = parse_env("BACKEND_PORT", value)?;
    }
    if let Some(value) = lookup("CORS_ALLOWED_ORIGINS") {
        config.cors.allowed_origins = split_list(&value);
    }
    if let Some(value) = lookup("CORS_PRIVATE_NETWORK_PREFIXES") {
        config.cors.private_network_prefixes = split_list(&value);
    }
    if let Some(value) = lookup("CORS_APP_SCHEMES") {
        config.cors.app_schemes = split_list(&value);
    }
    if let Some(value) = lookup("PROXY_CONNECT_TIMEOUT_SECS") {
        config.timeouts.connect_secs = parse_env("PROXY_CONNECT_TIMEOUT_SECS", value)?;
    }
    if let Some(value) = lookup("PROXY_REQUEST_TIMEOUT_SECS") {
        config.timeouts.request_secs = parse_env("PROXY_REQUEST_TIMEOUT_SECS", value)?;
    }
    if let Some(value) = lookup("LOG_LEVEL") {
        config.observability.log_level = value;
    }
    Ok(config)
}

fn parse_env<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        reason: e.to_string(),
        value,
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
