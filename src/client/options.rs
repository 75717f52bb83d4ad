//! Client defaults and per-call overrides.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

use crate::client::error::ClientError;
use crate::client::events::{AsyncEventHook, EventHook};
use crate::client::transport::Request;
use crate::observability::tracing::apply_trace_header;
use crate::resilience::{CircuitBreaker, RetryPolicy};

/// Overrides for a single call. Unset fields fall back to the client's defaults.
pub struct RequestOptions<H: ?Sized> {
    /// Merged over the client's default headers; same-name headers replace.
    pub headers: HeaderMap,
    pub request_id: Option<String>,
    pub timeout: Option<Duration>,
    pub policy: Option<RetryPolicy>,
    pub breaker: Option<Arc<CircuitBreaker>>,
    pub hook: Option<Arc<H>>,
}

/// Per-call options for [`BlockingClient`](crate::client::BlockingClient).
pub type BlockingOptions = RequestOptions<dyn EventHook>;

/// Per-call options for [`AsyncClient`](crate::client::AsyncClient).
pub type AsyncOptions = RequestOptions<dyn AsyncEventHook>;

impl<H: ?Sized> Default for RequestOptions<H> {
    fn default() -> Self {
        Self {
            headers: HeaderMap::new(),
            request_id: None,
            timeout: None,
            policy: None,
            breaker: None,
            hook: None,
        }
    }
}

impl<H: ?Sized> Clone for RequestOptions<H> {
    fn clone(&self) -> Self {
        Self {
            headers: self.headers.clone(),
            request_id: self.request_id.clone(),
            timeout: self.timeout,
            policy: self.policy,
            breaker: self.breaker.clone(),
            hook: self.hook.clone(),
        }
    }
}

impl<H: ?Sized> std::fmt::Debug for RequestOptions<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOptions")
            .field("headers", &self.headers)
            .field("request_id", &self.request_id)
            .field("timeout", &self.timeout)
            .field("policy", &self.policy)
            .field("breaker", &self.breaker)
            .field("hook", &self.hook.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

impl<H: ?Sized> RequestOptions<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn with_hook(mut self, hook: Arc<H>) -> Self {
        self.hook = Some(hook);
        self
    }
}

/// Client-level defaults shared by the blocking and async clients.
#[derive(Debug, Clone, Default)]
pub(crate) struct ClientDefaults {
    pub policy: RetryPolicy,
    pub headers: HeaderMap,
    pub trace_header: Option<HeaderName>,
    pub timeout: Option<Duration>,
    pub breaker: Option<Arc<CircuitBreaker>>,
}

impl ClientDefaults {
    pub fn policy<'a, H: ?Sized>(&'a self, options: &'a RequestOptions<H>) -> &'a RetryPolicy {
        options.policy.as_ref().unwrap_or(&self.policy)
    }

    pub fn breaker<'a, H: ?Sized>(
        &'a self,
        options: &'a RequestOptions<H>,
    ) -> Option<&'a CircuitBreaker> {
        options.breaker.as_deref().or(self.breaker.as_deref())
    }

    pub fn set_trace_header(&mut self, name: &str) -> Result<(), ClientError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::invalid(format!("invalid trace header '{name}': {e}")))?;
        self.trace_header = Some(name);
        Ok(())
    }

    /// Build the outgoing request and settle its correlation id.
    pub fn prepare<H: ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        options: &RequestOptions<H>,
    ) -> Result<(Request, Option<String>), ClientError> {
        let parsed = Url::parse(url)
            .map_err(|e| ClientError::invalid(format!("invalid URL '{url}': {e}")))?;

        let mut headers = self.headers.clone();
        headers.extend(options.headers.clone());

        let request_id = apply_trace_header(
            &mut headers,
            self.trace_header.as_ref(),
            options.request_id.clone(),
        )
        .map_err(|e| ClientError::invalid(format!("invalid request id: {e}")))?;

        let request = Request {
            method,
            url: parsed,
            headers,
            body,
            timeout: options.timeout.or(self.timeout),
        };
        Ok((request, request_id))
    }
}
