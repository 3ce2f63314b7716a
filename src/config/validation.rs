//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, log levels and histogram buckets
//! - Reject empty header precedence lists
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TelemetryConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::TelemetryConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            field,
            format!("{value:?} is not a socket address"),
        ));
    }
}

fn check_buckets(field: &'static str, buckets: &[f64], errors: &mut Vec<ValidationError>) {
    if buckets.is_empty() {
        errors.push(ValidationError::new(field, "must not be empty"));
        return;
    }
    if buckets.iter().any(|b| !b.is_finite() || *b <= 0.0) {
        errors.push(ValidationError::new(field, "buckets must be positive and finite"));
    }
    if buckets.windows(2).any(|w| w[0] >= w[1]) {
        errors.push(ValidationError::new(field, "buckets must be strictly increasing"));
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &TelemetryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::new("service.name", "must not be empty"));
    }

    if config.metrics.enabled {
        check_address("metrics.exporter_address", &config.metrics.exporter_address, &mut errors);
    }
    check_buckets("metrics.duration_buckets_ms", &config.metrics.duration_buckets_ms, &mut errors);
    check_buckets("metrics.size_buckets_bytes", &config.metrics.size_buckets_bytes, &mut errors);

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "logging.level",
            format!("unknown level {:?}", config.logging.level),
        ));
    }

    if config.headers.client_ip.is_empty() {
        errors.push(ValidationError::new("headers.client_ip", "must not be empty"));
    }
    if config.headers.request_id.is_empty() {
        errors.push(ValidationError::new("headers.request_id", "must not be empty"));
    }

    check_address("server.bind_address", &config.server.bind_address, &mut errors);
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
