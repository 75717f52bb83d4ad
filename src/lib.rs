//! Resilient JSON-over-HTTP client library.

pub mod client;
pub mod config;
pub mod observability;
pub mod pagination;
pub mod resilience;

pub use client::{
    AsyncClient, AsyncOptions, BlockingClient, BlockingOptions, ClientError, ClientEvent,
    ErrorKind, EventKind, JsonReply,
};
pub use config::ClientConfig;
pub use resilience::{CircuitBreaker, CircuitState, RetryPolicy};
