//! Resilient JSON client.
//!
//! # Data Flow
//! ```text
//! fetch_json / request_json
//!     → options.rs (merge per-call overrides over client defaults)
//!     → lifecycle.rs (validate policy, gate on breaker)
//!     → transport.rs (one attempt over HTTP)
//!     → lifecycle.rs (classify: retry, fail, or decode JSON)
//!     → events.rs (attempt_start, attempt_error, attempt_response, sleep, complete)
//!
//! fetch_json_array_paginated
//!     → fetch_json per page
//!     → pagination (Link header, cycle and cap checks)
//! ```
//!
//! # Design Decisions
//! - One state machine, two drivers: `BlockingClient` sleeps the thread,
//!   `AsyncClient` awaits the tokio timer
//! - Only connection-level failures are retried by default; 429 is
//!   retried on opt-in and honors an integer `Retry-After`
//! - Timeouts and non-2xx statuses fail immediately
//! - Hooks observe; they cannot alter the outcome except by failing

pub mod blocking;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod nonblocking;
pub mod options;
pub mod transport;

pub use blocking::BlockingClient;
pub use error::{ClientError, ErrorKind};
pub use events::{AsyncEventHook, ClientEvent, EventHook, EventKind, EventLog, HookError};
pub use lifecycle::JsonReply;
pub use nonblocking::AsyncClient;
pub use options::{AsyncOptions, BlockingOptions, RequestOptions};
pub use transport::{
    AsyncTransport, BlockingReqwestTransport, Request, ReqwestTransport, Response, Transport,
    TransportError,
};
