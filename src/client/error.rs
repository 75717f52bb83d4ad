//! Client error taxonomy.

use thiserror::Error;

use crate::client::events::HookError;
use crate::client::transport::{Response, TransportError};
use crate::resilience::CircuitOpenError;

/// Errors surfaced by the blocking and async clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Bad policy, bad page cap, bad URL or header, or a JSON shape mismatch.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An attempt exceeded its deadline. Never retried.
    #[error("request to {url} timed out: {source}")]
    Timeout {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The breaker refused the attempt before any network call.
    #[error("request to {url} rejected: {source}")]
    CircuitOpen {
        url: String,
        #[source]
        source: CircuitOpenError,
    },

    /// Connection-level failures exhausted every attempt.
    #[error("request to {url} failed after {attempts} attempt(s): {source}")]
    RequestFailed {
        url: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// Non-2xx response not absorbed by 429 handling.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        status: u16,
        url: String,
        response: Box<Response>,
        body: String,
    },

    /// A 2xx body that is not JSON.
    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A `next` link pointed at a page that was already fetched.
    #[error("pagination cycle: {url} was already visited")]
    PaginationCycle { url: String },

    /// The page cap was reached while a `next` link remained.
    #[error("pagination exceeded {max_pages} page(s); next page was {next_url}")]
    PaginationLimitExceeded { max_pages: u32, next_url: String },

    /// An observer hook failed and aborted the request.
    #[error("event hook failed: {0}")]
    Hook(#[source] HookError),
}

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Timeout,
    CircuitOpen,
    Transport,
    HttpStatus,
    Decode,
    Pagination,
    Hook,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            Self::RequestFailed { .. } => ErrorKind::Transport,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::PaginationCycle { .. } | Self::PaginationLimitExceeded { .. } => {
                ErrorKind::Pagination
            }
            Self::Hook(_) => ErrorKind::Hook,
        }
    }

    /// Status code of an [`ClientError::HttpStatus`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response of an [`ClientError::HttpStatus`].
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::HttpStatus { response, .. } => Some(&**response),
            _ => None,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
