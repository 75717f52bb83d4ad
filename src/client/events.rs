//! Request lifecycle events and observer hooks.
//!
//! Events are immutable records, one per lifecycle milestone, handed to an
//! optional hook in the order they happen. The executor behaves identically
//! with or without a hook attached; a hook that returns an error aborts the
//! request with [`ClientError::Hook`](crate::client::ClientError::Hook).

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;

/// Lifecycle milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AttemptStart,
    AttemptError,
    AttemptResponse,
    Sleep,
    Complete,
}

/// One lifecycle milestone of a single logical request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub url: String,
    /// 0-based attempt index.
    pub attempt: u32,
    /// Total attempts the policy allows.
    pub retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
}

impl ClientEvent {
    pub(crate) fn new(
        kind: EventKind,
        url: &str,
        attempt: u32,
        retries: u32,
        request_id: Option<&str>,
    ) -> Self {
        Self {
            kind,
            url: url.to_string(),
            attempt,
            retries,
            request_id: request_id.map(str::to_string),
            status_code: None,
            error: None,
            sleep_seconds: None,
            elapsed_seconds: None,
            ok: None,
        }
    }

    pub(crate) fn status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub(crate) fn error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub(crate) fn sleep_seconds(mut self, secs: f64) -> Self {
        self.sleep_seconds = Some(secs);
        self
    }

    pub(crate) fn elapsed_seconds(mut self, secs: f64) -> Self {
        self.elapsed_seconds = Some(secs);
        self
    }

    pub(crate) fn ok(mut self, ok: bool) -> Self {
        self.ok = Some(ok);
        self
    }
}

/// Error returned by a hook. Aborts the request it was observing.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Observer for the blocking client.
pub trait EventHook: Send + Sync {
    fn on_event(&self, event: &ClientEvent) -> Result<(), HookError>;
}

impl<F> EventHook for F
where
    F: Fn(&ClientEvent) -> Result<(), HookError> + Send + Sync,
{
    fn on_event(&self, event: &ClientEvent) -> Result<(), HookError> {
        self(event)
    }
}

/// Observer for the async client. Awaited before the request continues.
#[async_trait]
pub trait AsyncEventHook: Send + Sync {
    async fn on_event(&self, event: &ClientEvent) -> Result<(), HookError>;
}

#[async_trait]
impl<F> AsyncEventHook for F
where
    F: Fn(&ClientEvent) -> Result<(), HookError> + Send + Sync,
{
    async fn on_event(&self, event: &ClientEvent) -> Result<(), HookError> {
        self(event)
    }
}

/// Hook that keeps every event it sees.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<ClientEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ClientEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, event: &ClientEvent) {
        self.lock().push(event.clone());
    }

    pub fn snapshot(&self) -> Vec<ClientEvent> {
        self.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.lock().iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.lock().iter().filter(|e| e.kind == kind).count()
    }
}

impl EventHook for EventLog {
    fn on_event(&self, event: &ClientEvent) -> Result<(), HookError> {
        self.push(event);
        Ok(())
    }
}

#[async_trait]
impl AsyncEventHook for EventLog {
    async fn on_event(&self, event: &ClientEvent) -> Result<(), HookError> {
        self.push(event);
        Ok(())
    }
}
