//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt against an upstream:
//!     → circuit_breaker.rs (fail fast while the upstream is known bad)
//!     → transport call (per-attempt timeout owned by the transport)
//!     → On failure: retries.rs (policy says whether attempts remain)
//!     → backoff.rs (how long to wait: Retry-After or exponential + jitter)
//! ```
//!
//! # Design Decisions
//! - Timeouts are never retried; connection errors are
//! - A 429 is a controlled retry only when the policy opts in
//! - One breaker per upstream, shared by every request to it
//! - Backoff and Retry-After are pure functions, trivially testable

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;

pub use backoff::{backoff_delay, retry_after_seconds};
pub use circuit_breaker::{Admission, CircuitBreaker, CircuitOpenError, CircuitState};
pub use retries::RetryPolicy;
