//! Blocking client: drives the lifecycle with thread sleeps.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::{Map, Value};

use crate::client::error::ClientError;
use crate::client::events::EventHook;
use crate::client::lifecycle::{expect_array, JsonReply, Lifecycle, Step};
use crate::client::options::{BlockingOptions, ClientDefaults};
use crate::client::transport::Transport;
use crate::pagination::PageCursor;
use crate::resilience::{CircuitBreaker, RetryPolicy};

/// JSON client that blocks the calling thread, including during backoff.
pub struct BlockingClient<T> {
    transport: T,
    defaults: ClientDefaults,
    hook: Option<Arc<dyn EventHook>>,
}

impl<T: Transport> BlockingClient<T> {
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

    pub fn with_hook(mut self, hook: Arc<dyn EventHook>) -> Self {
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
    pub fn request_json(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        options: &BlockingOptions,
    ) -> Result<JsonReply, ClientError> {
        let policy = self.defaults.policy(options);
        let breaker = self.defaults.breaker(options);
        let hook = options.hook.as_ref().or(self.hook.as_ref());

        let mut lifecycle = Lifecycle::new(url, policy, breaker)?;
        let (request, request_id) = self.defaults.prepare(method, url, body, options)?;
        lifecycle.set_request_id(request_id);

        loop {
            lifecycle.begin_attempt()?;
            emit(hook, &mut lifecycle)?;

            let outcome = self.transport.execute(&request);
            let step = lifecycle.finish_attempt(outcome);
            emit(hook, &mut lifecycle)?;

            match step {
                Step::Retry(delay) => {
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                Step::Done(result) => return result,
            }
        }
    }

    /// GET `url` and return the full reply.
    pub fn fetch_json(
        &self,
        url: &str,
        options: &BlockingOptions,
    ) -> Result<JsonReply, ClientError> {
        self.request_json(Method::GET, url, None, options)
    }

    /// GET `url`; the body must be a JSON object.
    pub fn fetch_json_object(
        &self,
        url: &str,
        options: &BlockingOptions,
    ) -> Result<Map<String, Value>, ClientError> {
        self.fetch_json(url, options)?.into_object()
    }

    /// GET `url`; the body must be a JSON array.
    pub fn fetch_json_array(
        &self,
        url: &str,
        options: &BlockingOptions,
    ) -> Result<Vec<Value>, ClientError> {
        self.fetch_json(url, options)?.into_array()
    }

    /// GET `url` and every `rel="next"` page after it, concatenating the arrays.
    pub fn fetch_json_array_paginated(
        &self,
        url: &str,
        max_pages: u32,
        options: &BlockingOptions,
    ) -> Result<Vec<Value>, ClientError> {
        let mut cursor = PageCursor::new(url, max_pages)?;
        let mut items = Vec::new();
        let mut current = url.to_string();

        loop {
            let JsonReply { response, body, .. } = self.fetch_json(&current, options)?;
            items.extend(expect_array(&current, body)?);

            match cursor.advance(&response)? {
                Some(next) => current = next.into(),
                None => return Ok(items),
            }
        }
    }
}

fn emit(
    hook: Option<&Arc<dyn EventHook>>,
    lifecycle: &mut Lifecycle<'_>,
) -> Result<(), ClientError> {
    let events = lifecycle.take_events();
    if let Some(hook) = hook {
        for event in &events {
            hook.on_event(event).map_err(ClientError::Hook)?;
        }
    }
    Ok(())
}
