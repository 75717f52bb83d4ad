//! HTTP transport boundary.
//!
//! # Responsibilities
//! - Define the request/response shapes the executor works with
//! - Classify failures as timeout or connection-level
//! - Provide reqwest-backed transports (blocking and async)
//!
//! # Design Decisions
//! - The executor never sees reqwest types; tests swap in scripted transports
//! - Bodies are fully buffered; the executor needs them for JSON and errors
//! - The per-attempt timeout is enforced by the transport

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use thiserror::Error;
use url::Url;

/// One outgoing attempt.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    /// Deadline for this attempt alone.
    pub timeout: Option<Duration>,
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    url: Url,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, url: Url, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            url,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Effective URL of the request that produced this response.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Failure to obtain a response at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The attempt exceeded its deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// DNS, refused connection, reset, TLS, body read failure.
    #[error("connection error: {0}")]
    Connection(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

/// Blocking transport. Called from the thread that issued the request.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &Request) -> Result<Response, TransportError>;
}

/// Async transport. Called from the task that issued the request.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn execute(&self, request: &Request) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).execute(request)
    }
}

#[async_trait]
impl<T: AsyncTransport + ?Sized> AsyncTransport for Arc<T> {
    async fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).execute(request).await
    }
}

/// Async transport over a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AsyncTransport for ReqwestTransport {
    async fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response::new(status, url, headers, body.to_vec()))
    }
}

/// Blocking transport over `reqwest::blocking::Client`.
///
/// Must not be constructed or dropped inside an async runtime.
#[derive(Debug, Clone, Default)]
pub struct BlockingReqwestTransport {
    client: reqwest::blocking::Client,
}

impl BlockingReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for BlockingReqwestTransport {
    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.bytes()?;

        Ok(Response::new(status, url, headers, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> Response {
        Response::new(
            status,
            Url::parse("http://example.test/items").unwrap(),
            HeaderMap::new(),
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_success_range() {
        assert!(response(200, "").is_success());
        assert!(response(299, "").is_success());
        assert!(!response(300, "").is_success());
        assert!(!response(199, "").is_success());
    }

    #[test]
    fn test_json_and_text() {
        let r = response(200, r#"{"ok":true}"#);
        assert_eq!(r.json().unwrap(), serde_json::json!({"ok": true}));
        assert_eq!(r.text(), r#"{"ok":true}"#);
        assert!(response(200, "not json").json().is_err());
    }

    #[test]
    fn test_timeout_classification() {
        assert!(TransportError::Timeout("slow".into()).is_timeout());
        assert!(!TransportError::Connection("refused".into()).is_timeout());
    }
}
