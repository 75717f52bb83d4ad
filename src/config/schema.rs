//! Configuration schema definitions.
//!
//! Every section is `#[serde(default)]`, so a file only needs the keys it
//! changes. The CLI layers its flags over whatever is loaded here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::{CircuitBreaker, RetryPolicy};

/// Root configuration for the client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Retry policy applied to every call.
    pub retry: RetryPolicy,

    /// Circuit breaker shared by all calls.
    pub breaker: BreakerConfig,

    /// Per-attempt timeouts.
    pub timeouts: TimeoutConfig,

    /// Correlation id propagation.
    pub tracing: TracingConfig,

    /// Link header pagination.
    pub pagination: PaginationConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

impl ClientConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// `None` when the breaker is disabled.
    pub fn circuit_breaker(&self) -> Option<CircuitBreaker> {
        if !self.breaker.enabled {
            return None;
        }
        let reset =
            Duration::try_from_secs_f64(self.breaker.reset_secs).unwrap_or(Duration::ZERO);
        Some(CircuitBreaker::new(self.breaker.failure_threshold, reset))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeouts.request_secs)
            .unwrap_or(Duration::from_secs(30))
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Enable the breaker.
    pub enabled: bool,

    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before a trial request is allowed.
    pub reset_secs: f64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            failure_threshold: 5,
            reset_secs: 30.0,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a single attempt, in seconds.
    pub request_secs: f64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30.0 }
    }
}

/// Correlation id settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TracingConfig {
    /// Header that carries the request id (e.g. "X-Request-Id").
    pub header: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub max_pages: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { max_pages: 10 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of compact text.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}
