//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request lifecycle produces:
//!     → logging.rs (structured log events on stderr)
//!     → metrics.rs (attempt, retry, breaker, page counters)
//!     → tracing.rs (correlation id sent upstream in the trace header)
//!
//! Consumers:
//!     → Log aggregation (stderr, plain or JSON)
//!     → Whatever `metrics` recorder the host application installs
//!     → The upstream, via the trace header
//! ```
//!
//! # Design Decisions
//! - Structured fields (url, attempt, request_id) on every log line
//! - stdout stays clean for CLI JSON output
//! - Metrics are facade calls; without a recorder they cost nothing
//! - One request id per logical request, reused across its retries

pub mod logging;
pub mod metrics;
pub mod tracing;
