//! Retry policy.
//!
//! # Responsibilities
//! - Describe how many attempts a single logical request may use
//! - Decide whether a 429 is retried or surfaced as a status error
//! - Carry the exponential backoff shape
//!
//! # Design Decisions
//! - Immutable value object, passed by reference into every request
//! - `retries < 1` is only rejected when a request is made with it

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::backoff::backoff_delay;

/// Retry parameters for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub retries: u32,

    /// Retry a 429 response instead of failing with a status error.
    pub retry_on_429: bool,

    /// Base delay in seconds. Zero disables sleeping between attempts.
    pub backoff_base: f64,

    /// Multiplier applied per attempt.
    pub backoff_factor: f64,

    /// Additive jitter as a fraction of the computed delay.
    pub backoff_jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_on_429: false,
            backoff_base: 0.5,
            backoff_factor: 2.0,
            backoff_jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            retries: 1,
            ..Self::default()
        }
    }

    /// Whether another attempt may follow the 0-based `attempt`.
    pub fn has_attempts_after(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.retries
    }

    /// Computed backoff for the 0-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        backoff_delay(
            attempt,
            self.backoff_base,
            self.backoff_factor,
            self.backoff_jitter,
        )
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_on_429(mut self, enabled: bool) -> Self {
        self.retry_on_429 = enabled;
        self
    }

    pub fn with_backoff(mut self, base: f64, factor: f64, jitter: f64) -> Self {
        self.backoff_base = base;
        self.backoff_factor = factor;
        self.backoff_jitter = jitter;
        self
    }
}
