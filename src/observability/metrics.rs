//! Client metrics.
//!
//! # Metrics
//! - `netclient_attempts_total` (counter): attempts by outcome
//! - `netclient_retries_total` (counter): scheduled retries by reason
//! - `netclient_breaker_rejections_total` (counter): attempts refused by a breaker
//! - `netclient_breaker_transitions_total` (counter): breaker transitions by target state
//! - `netclient_pages_total` (counter): pages fetched by the pagination driver

use crate::resilience::CircuitState;

/// Outcome label for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Status,
    Timeout,
    Transport,
    /// A 2xx whose body was not JSON.
    Decode,
}

impl AttemptOutcome {
    fn as_label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Status => "status",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::Decode => "decode",
        }
    }
}

pub fn record_attempt(outcome: AttemptOutcome) {
    metrics::counter!("netclient_attempts_total", "outcome" => outcome.as_label()).increment(1);
}

/// `reason` is `"transport"` or `"rate_limited"`.
pub fn record_retry(reason: &'static str) {
    metrics::counter!("netclient_retries_total", "reason" => reason).increment(1);
}

pub fn record_breaker_rejection() {
    metrics::counter!("netclient_breaker_rejections_total").increment(1);
}

pub fn record_breaker_transition(to: CircuitState) {
    let label = match to {
        CircuitState::Closed => "closed",
        CircuitState::Open => "open",
        CircuitState::HalfOpen => "half_open",
    };
    metrics::counter!("netclient_breaker_transitions_total", "to" => label).increment(1);
}

pub fn record_page() {
    metrics::counter!("netclient_pages_total").increment(1);
}
