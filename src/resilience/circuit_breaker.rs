//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: upstream assumed down, requests fail fast
//! - Half-Open: cooldown elapsed, exactly one trial request may pass
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Open → Half-Open: now - opened_at >= reset
//! Half-Open → Closed: trial request succeeds
//! Half-Open → Open: trial request fails (opened_at restamped)
//! ```
//!
//! # Design Decisions
//! - One breaker per upstream, shared via `Arc` by every request to it
//! - Fail fast in Open state (no network call is attempted)
//! - Single trial request in Half-Open (no stampede)
//! - A single success fully resets the breaker
//! - Callers pass `now`, so transitions are deterministic under test

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::observability::metrics;

/// Observable breaker state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// An attempt was rejected before reaching the network.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("circuit open, retry in {}s", .retry_in.as_secs_f64())]
pub struct CircuitOpenError {
    /// Time left until the cooldown elapses. Zero while the half-open trial is in flight.
    pub retry_in: Duration,
}

/// How an attempt got past the breaker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Admission {
    /// The circuit is closed.
    Closed,
    /// This attempt holds the single half-open slot.
    HalfOpen,
}

#[derive(Debug, Default)]
struct BreakerState {
    failures: u32,
    opened_at: Option<Instant>,
    half_open_used: bool,
}

/// Consecutive-failure circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    reset: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, reset: Duration) -> Self {
        Self {
            failure_threshold,
            reset,
            state: Mutex::new(BreakerState::default()),
        }
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn reset_after(&self) -> Duration {
        self.reset
    }

    /// Lock the state, recovering from poison.
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Gate an attempt. Must be called before every network call.
    pub fn allow(&self, now: Instant) -> Result<(), CircuitOpenError> {
        self.admit(now).map(|_| ())
    }

    /// Like [`allow`](Self::allow), but reports whether the attempt took the
    /// half-open slot.
    ///
    /// A half-open attempt must be settled with `record_success` or `record_failure`,
    /// or handed back with `release_half_open` if it never reached the network.
    pub fn admit(&self, now: Instant) -> Result<Admission, CircuitOpenError> {
        let mut state = self.lock();

        let Some(opened_at) = state.opened_at else {
            return Ok(Admission::Closed);
        };

        let elapsed = now.saturating_duration_since(opened_at);
        if elapsed < self.reset {
            metrics::record_breaker_rejection();
            return Err(CircuitOpenError {
                retry_in: self.reset - elapsed,
            });
        }

        if state.half_open_used {
            metrics::record_breaker_rejection();
            return Err(CircuitOpenError {
                retry_in: Duration::ZERO,
            });
        }

        state.half_open_used = true;
        metrics::record_breaker_transition(CircuitState::HalfOpen);
        tracing::info!(failures = state.failures, "Circuit half-open, allowing one attempt");
        Ok(Admission::HalfOpen)
    }

    /// Free the half-open slot without settling it.
    pub fn release_half_open(&self) {
        let mut state = self.lock();
        if state.opened_at.is_some() && state.half_open_used {
            state.half_open_used = false;
            tracing::debug!("Half-open slot released unsent");
        }
    }

    /// Close the circuit and forget all failures.
    pub fn record_success(&self) {
        let mut state = self.lock();
        if state.opened_at.is_some() {
            metrics::record_breaker_transition(CircuitState::Closed);
            tracing::info!("Circuit closed");
        }
        *state = BreakerState::default();
    }

    /// Count a failure, opening the circuit once the threshold is reached.
    pub fn record_failure(&self, now: Instant) {
        let mut state = self.lock();
        state.failures = state.failures.saturating_add(1);

        if state.failures >= self.failure_threshold {
            state.opened_at = Some(now);
            state.half_open_used = false;
            metrics::record_breaker_transition(CircuitState::Open);
            tracing::warn!(
                failures = state.failures,
                threshold = self.failure_threshold,
                reset_secs = self.reset.as_secs_f64(),
                "Circuit opened"
            );
        }
    }

    /// Current consecutive failure count.
    pub fn failures(&self) -> u32 {
        self.lock().failures
    }

    /// State as `allow(now)` would see it, without taking the half-open slot.
    pub fn state(&self, now: Instant) -> CircuitState {
        let state = self.lock();
        match state.opened_at {
            None => CircuitState::Closed,
            Some(opened_at) if now.saturating_duration_since(opened_at) < self.reset => {
                CircuitState::Open
            }
            Some(_) => CircuitState::HalfOpen,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(30))
    }
}
