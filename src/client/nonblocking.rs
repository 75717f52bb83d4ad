//! Async client: same lifecycle as the blocking one, waits on the tokio timer.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::{Map, Value};

use crate::client::error::ClientError;
use crate::client::events::AsyncEventHook;
use crate::client::lifecycle::{expect_array, JsonReply, Lifecycle, Step};
use crate::client::options::{AsyncOptions, ClientDefaults};
use crate::client::transport::AsyncTransport;
use crate::pagination::PageCursor;
use crate::resilience::{CircuitBreaker, RetryPolicy};

/// JSON client for tokio. Backoff waits yield to the runtime.
pub struct AsyncClient<T> {
    transport: T,
    defaults: ClientDefaults,
    hook: Option<Arc<dyn AsyncEventHook>>,
}

impl<T: AsyncTransport> AsyncClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            defaults: ClientDefaults::default(),
            hook: None,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.defaults.policy = policy;
        self
    }

    /// Send a correlation id under `name` on every request.
    pub fn with_trace_header(mut self, name: &str) -> Result<Self, ClientError> {
        self.defaults.set_trace_header(name)?;
        Ok(self)
    }

    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.defaults.headers.append(name, value);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = Some(timeout);
        self
    }

    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.defaults.breaker = Some(breaker);
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn AsyncEventHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.defaults.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one logical request with any method and return its JSON body.
    pub async fn request_json(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        options: &AsyncOptions,
    ) -> Result<JsonReply, ClientError> {
        let policy = self.defaults.policy(options);
        let breaker = self.defaults.breaker(options);
        let hook = options.hook.as_ref().or(self.hook.as_ref());

        let mut lifecycle = Lifecycle::new(url, policy, breaker)?;
        let (request, request_id) = self.defaults.prepare(method, url, body, options)?;
        lifecycle.set_request_id(request_id);

        loop {
            lifecycle.begin_attempt()?;
            emit(hook, &mut lifecycle).await?;

            let outcome = self.transport.execute(&request).await;
            let step = lifecycle.finish_attempt(outcome);
            emit(hook, &mut lifecycle).await?;

            match step {
                Step::Retry(delay) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Step::Done(result) => return result,
            }
        }
    }

    pub async fn fetch_json(
        &self,
        url: &str,
        options: &AsyncOptions,
    ) -> Result<JsonReply, ClientError> {
        self.request_json(Method::GET, url, None, options).await
    }

    pub async fn fetch_json_object(
        &self,
        url: &str,
        options: &AsyncOptions,
    ) -> Result<Map<String, Value>, ClientError> {
        self.fetch_json(url, options).await?.into_object()
    }

    pub async fn fetch_json_array(
        &self,
        url: &str,
        options: &AsyncOptions,
    ) -> Result<Vec<Value>, ClientError> {
        self.fetch_json(url, options).await?.into_array()
    }

    /// Follow `rel="next"` links from `url`, concatenating every page's array.
    ///
    /// Stops with `PaginationCycle` on a revisited URL and with
    /// `PaginationLimitExceeded` when `max_pages` pages were fetched and
    /// another one is still advertised.
    pub async fn fetch_json_array_paginated(
        &self,
        url: &str,
        max_pages: u32,
        options: &AsyncOptions,
    ) -> Result<Vec<Value>, ClientError> {
        let mut cursor = PageCursor::new(url, max_pages)?;
        let mut items = Vec::new();
        let mut current = url.to_string();

        loop {
            let JsonReply { response, body, .. } = self.fetch_json(&current, options).await?;
            items.extend(expect_array(&current, body)?);

            match cursor.advance(&response)? {
                Some(next) => current = next.into(),
                None => return Ok(items),
            }
        }
    }
}

async fn emit(
    hook: Option<&Arc<dyn AsyncEventHook>>,
    lifecycle: &mut Lifecycle<'_>,
) -> Result<(), ClientError> {
    let events = lifecycle.take_events();
    if let Some(hook) = hook {
        for event in &events {
            hook.on_event(event).await.map_err(ClientError::Hook)?;
        }
    }
    Ok(())
}
