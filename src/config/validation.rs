//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds, delays, page cap, timeout)
//! - Check the trace header is a legal HTTP header name
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - `retry.retries` is left alone; a zero is rejected when a request is made

use reqwest::header::HeaderName;
use thiserror::Error;

use crate::config::schema::ClientConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Error)]
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

pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let retry = &config.retry;
    if !(retry.backoff_base >= 0.0) {
        errors.push(ValidationError::new(
            "retry.backoff_base",
            format!("must be >= 0, got {}", retry.backoff_base),
        ));
    }
    if !(retry.backoff_factor.is_finite() && retry.backoff_factor >= 0.0) {
        errors.push(ValidationError::new(
            "retry.backoff_factor",
            format!("must be finite and >= 0, got {}", retry.backoff_factor),
        ));
    }
    if !(retry.backoff_jitter >= 0.0) {
        errors.push(ValidationError::new(
            "retry.backoff_jitter",
            format!("must be >= 0, got {}", retry.backoff_jitter),
        ));
    }

    let breaker = &config.breaker;
    if breaker.failure_threshold < 1 {
        errors.push(ValidationError::new(
            "breaker.failure_threshold",
            "must be >= 1",
        ));
    }
    if !(breaker.reset_secs.is_finite() && breaker.reset_secs >= 0.0) {
        errors.push(ValidationError::new(
            "breaker.reset_secs",
            format!("must be finite and >= 0, got {}", breaker.reset_secs),
        ));
    }

    let timeout = config.timeouts.request_secs;
    if !(timeout.is_finite() && timeout > 0.0) {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!("must be > 0, got {timeout}"),
        ));
    }

    if let Some(header) = &config.tracing.header {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "tracing.header",
                format!("'{header}' is not a valid header name"),
            ));
        }
    }

    if config.pagination.max_pages < 1 {
        errors.push(ValidationError::new("pagination.max_pages", "must be >= 1"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!(
                "'{}' is not one of {}",
                config.observability.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
