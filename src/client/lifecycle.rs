//! The request state machine.
//!
//! # Responsibilities
//! - Validate the policy before any network activity
//! - Gate every attempt through the circuit breaker
//! - Classify each attempt's outcome and decide: retry, fail, or return
//! - Record breaker successes and failures
//! - Queue lifecycle events in the order they happen
//!
//! # Design Decisions
//! - No I/O and no sleeping here. The blocking and async clients drive
//!   the same machine and differ only in how they wait and call hooks
//! - A driver loop is: `begin_attempt`, perform the request,
//!   `finish_attempt`, then sleep on `Step::Retry` or return on `Step::Done`
//! - Events are drained by the driver after each call, so a hook sees
//!   `attempt_start` before the request goes out and `sleep` before the wait
//! - Every attempt admitted by the breaker settles it. A half-open slot that
//!   never reaches `finish_attempt` is released when the lifecycle drops

use std::time::{Duration, Instant};

use serde_json::{Map, Value};

use crate::client::error::ClientError;
use crate::client::events::{ClientEvent, EventKind};
use crate::client::transport::{Response, TransportError};
use crate::observability::metrics::{self, AttemptOutcome};
use crate::resilience::backoff::retry_after_seconds;
use crate::resilience::{Admission, CircuitBreaker, RetryPolicy};

/// A successful JSON call.
#[derive(Debug, Clone)]
pub struct JsonReply {
    pub response: Response,
    pub body: Value,
    /// Correlation id used for this call, if any.
    pub request_id: Option<String>,
}

impl JsonReply {
    /// The body as a JSON object, or `InvalidInput`.
    pub fn into_object(self) -> Result<Map<String, Value>, ClientError> {
        expect_object(self.response.url().as_str(), self.body)
    }

    /// The body as a JSON array, or `InvalidInput`.
    pub fn into_array(self) -> Result<Vec<Value>, ClientError> {
        expect_array(self.response.url().as_str(), self.body)
    }
}

pub(crate) fn expect_object(url: &str, body: Value) -> Result<Map<String, Value>, ClientError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(ClientError::invalid(format!(
            "expected a JSON object from {url}, got {}",
            json_type(&other)
        ))),
    }
}

pub(crate) fn expect_array(url: &str, body: Value) -> Result<Vec<Value>, ClientError> {
    match body {
        Value::Array(items) => Ok(items),
        other => Err(ClientError::invalid(format!(
            "expected a JSON array from {url}, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// What the driver does after an attempt.
#[derive(Debug)]
pub(crate) enum Step {
    /// Wait this long, then run the next attempt.
    Retry(Duration),
    /// The call is over.
    Done(Result<JsonReply, ClientError>),
}

/// One logical request, across all of its attempts.
pub(crate) struct Lifecycle<'a> {
    url: String,
    policy: &'a RetryPolicy,
    breaker: Option<&'a CircuitBreaker>,
    /// The current attempt holds the breaker's half-open slot.
    holds_half_open: bool,
    request_id: Option<String>,
    attempt: u32,
    started: Instant,
    attempt_started: Instant,
    events: Vec<ClientEvent>,
}

impl<'a> Lifecycle<'a> {
    pub fn new(
        url: &str,
        policy: &'a RetryPolicy,
        breaker: Option<&'a CircuitBreaker>,
    ) -> Result<Self, ClientError> {
        if policy.retries < 1 {
            return Err(ClientError::invalid(format!(
                "retries must be >= 1, got {}",
                policy.retries
            )));
        }

        let now = Instant::now();
        Ok(Self {
            url: url.to_string(),
            policy,
            breaker,
            holds_half_open: false,
            request_id: None,
            attempt: 0,
            started: now,
            attempt_started: now,
            events: Vec::new(),
        })
    }

    pub fn set_request_id(&mut self, request_id: Option<String>) {
        self.request_id = request_id;
    }

    /// Events queued since the last drain, oldest first.
    pub fn take_events(&mut self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.events)
    }

    /// Gate and announce the next attempt.
    ///
    /// A breaker rejection is not an attempt: nothing is recorded and no
    /// event is queued.
    pub fn begin_attempt(&mut self) -> Result<(), ClientError> {
        let now = Instant::now();
        if let Some(breaker) = self.breaker {
            let admission = breaker.admit(now).map_err(|source| {
                tracing::warn!(
                    url = %self.url,
                    attempt = self.attempt,
                    request_id = ?self.request_id,
                    retry_in = ?source.retry_in,
                    "Circuit open, rejecting attempt"
                );
                ClientError::CircuitOpen {
                    url: self.url.clone(),
                    source,
                }
            })?;
            self.holds_half_open = admission == Admission::HalfOpen;
        }

        self.attempt_started = now;
        tracing::debug!(
            url = %self.url,
            attempt = self.attempt,
            retries = self.policy.retries,
            request_id = ?self.request_id,
            "Starting attempt"
        );
        self.push(self.event(EventKind::AttemptStart));
        Ok(())
    }

    /// Classify the outcome of the current attempt.
    pub fn finish_attempt(&mut self, outcome: Result<Response, TransportError>) -> Step {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.attempt_started);
        self.holds_half_open = false;

        let response = match outcome {
            Ok(response) => response,
            Err(error) if error.is_timeout() => {
                self.record_failure(now);
                metrics::record_attempt(AttemptOutcome::Timeout);
                tracing::warn!(
                    url = %self.url,
                    attempt = self.attempt,
                    request_id = ?self.request_id,
                    error = %error,
                    "Attempt timed out"
                );
                self.push(self.attempt_error(&error, elapsed));
                return Step::Done(Err(ClientError::Timeout {
                    url: self.url.clone(),
                    source: error,
                }));
            }
            Err(error) => {
                self.record_failure(now);
                metrics::record_attempt(AttemptOutcome::Transport);
                tracing::warn!(
                    url = %self.url,
                    attempt = self.attempt,
                    request_id = ?self.request_id,
                    error = %error,
                    "Attempt failed"
                );
                self.push(self.attempt_error(&error, elapsed));

                if self.policy.has_attempts_after(self.attempt) {
                    metrics::record_retry("transport");
                    let delay = self.policy.delay_for(self.attempt);
                    return self.schedule_retry(delay);
                }

                self.push(self.complete(false));
                return Step::Done(Err(ClientError::RequestFailed {
                    url: self.url.clone(),
                    attempts: self.attempt + 1,
                    source: error,
                }));
            }
        };

        let status = response.status();
        self.push(
            self.event(EventKind::AttemptResponse)
                .status_code(status)
                .elapsed_seconds(elapsed.as_secs_f64()),
        );

        if status == 429
            && self.policy.retry_on_429
            && self.policy.has_attempts_after(self.attempt)
        {
            self.record_failure(now);
            metrics::record_attempt(AttemptOutcome::Status);
            metrics::record_retry("rate_limited");
            let delay = retry_after_seconds(response.headers())
                .unwrap_or_else(|| self.policy.delay_for(self.attempt));
            return self.schedule_retry(delay);
        }

        if !response.is_success() {
            self.record_failure(now);
            metrics::record_attempt(AttemptOutcome::Status);
            tracing::warn!(
                url = %self.url,
                attempt = self.attempt,
                request_id = ?self.request_id,
                status,
                "Request failed with status"
            );
            self.push(self.complete(false));
            let body = response.text().into_owned();
            return Step::Done(Err(ClientError::HttpStatus {
                status,
                url: self.url.clone(),
                response: Box::new(response),
                body,
            }));
        }

        match response.json() {
            Ok(body) => {
                if let Some(breaker) = self.breaker {
                    breaker.record_success();
                }
                metrics::record_attempt(AttemptOutcome::Success);
                self.push(self.complete(true));
                Step::Done(Ok(JsonReply {
                    response,
                    body,
                    request_id: self.request_id.clone(),
                }))
            }
            Err(source) => {
                self.record_failure(now);
                metrics::record_attempt(AttemptOutcome::Decode);
                tracing::warn!(
                    url = %self.url,
                    attempt = self.attempt,
                    request_id = ?self.request_id,
                    status,
                    error = %source,
                    "Response body is not JSON"
                );
                self.push(self.complete(false));
                Step::Done(Err(ClientError::Decode {
                    url: self.url.clone(),
                    source,
                }))
            }
        }
    }

    fn schedule_retry(&mut self, delay: Duration) -> Step {
        tracing::info!(
            url = %self.url,
            attempt = self.attempt,
            request_id = ?self.request_id,
            delay = ?delay,
            "Retrying request"
        );
        self.push(self.event(EventKind::Sleep).sleep_seconds(delay.as_secs_f64()));
        self.attempt += 1;
        Step::Retry(delay)
    }

    fn record_failure(&self, now: Instant) {
        if let Some(breaker) = self.breaker {
            breaker.record_failure(now);
        }
    }

    fn push(&mut self, event: ClientEvent) {
        self.events.push(event);
    }

    fn event(&self, kind: EventKind) -> ClientEvent {
        ClientEvent::new(
            kind,
            &self.url,
            self.attempt,
            self.policy.retries,
            self.request_id.as_deref(),
        )
    }

    fn attempt_error(&self, error: &TransportError, elapsed: Duration) -> ClientEvent {
        self.event(EventKind::AttemptError)
            .error(error)
            .elapsed_seconds(elapsed.as_secs_f64())
    }

    fn complete(&self, ok: bool) -> ClientEvent {
        self.event(EventKind::Complete)
            .ok(ok)
            .elapsed_seconds(self.started.elapsed().as_secs_f64())
    }
}

impl Drop for Lifecycle<'_> {
    fn drop(&mut self) {
        if self.holds_half_open {
            if let Some(breaker) = self.breaker {
                breaker.release_half_open();
            }
        }
    }
}
