//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use netclient::client::{AsyncTransport, Request, Response, Transport, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// One canned outcome for a scripted transport.
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: String,
    },
    Refused,
    TimedOut,
}

pub fn reply(status: u16, body: &str) -> Scripted {
    Scripted::Reply {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

pub fn reply_with(status: u16, body: &str, headers: Vec<(&'static str, String)>) -> Scripted {
    Scripted::Reply {
        status,
        headers,
        body: body.to_string(),
    }
}

/// `reply(200, body)` carrying `Link: <next>; rel="next"`.
pub fn page(body: &str, next: &str) -> Scripted {
    reply_with(200, body, vec![("link", format!("<{next}>; rel=\"next\""))])
}

type Responder = Box<dyn Fn(&Request) -> Scripted + Send + Sync>;

/// In-memory transport for both clients. Records every request it sees.
pub struct ScriptedTransport {
    responder: Responder,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    /// Replay `script` in order, one outcome per attempt.
    pub fn new(script: Vec<Scripted>) -> Self {
        let queue = Mutex::new(VecDeque::from(script));
        Self::with_responder(move |request| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("script exhausted at {}", request.url))
        })
    }

    /// Answer every attempt with `f`.
    pub fn with_responder<F>(f: F) -> Self
    where
        F: Fn(&Request) -> Scripted + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(f),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.to_string())
            .collect()
    }

    fn respond(&self, request: &Request) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        match (self.responder)(request) {
            Scripted::Reply {
                status,
                headers,
                body,
            } => {
                let mut map = HeaderMap::new();
                for (name, value) in headers {
                    map.append(
                        HeaderName::from_bytes(name.as_bytes()).unwrap(),
                        HeaderValue::from_str(&value).unwrap(),
                    );
                }
                Ok(Response::new(status, request.url.clone(), map, body))
            }
            Scripted::Refused => Err(TransportError::Connection("connection refused".into())),
            Scripted::TimedOut => Err(TransportError::Timeout("deadline elapsed".into())),
        }
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        self.respond(request)
    }
}

#[async_trait]
impl AsyncTransport for ScriptedTransport {
    async fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        self.respond(request)
    }
}

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What the mock backend sends back.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub delay: Duration,
}

impl MockResponse {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Start a programmable HTTP/1.1 backend on an ephemeral port.
///
/// Runs on plain threads so both the blocking and async reqwest
/// transports can talk to it. Connections are served one at a time.
pub fn start_programmable_backend<F>(f: F) -> SocketAddr
where
    F: Fn(&RecordedRequest) -> MockResponse + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            if let Some(request) = read_request(&stream) {
                let response = f(&request);
                write_response(stream, &response);
            }
        }
    });

    addr
}

/// Start a backend that always answers `status` with `body`.
pub fn start_mock_backend(status: u16, body: &'static str) -> SocketAddr {
    start_programmable_backend(move |_| MockResponse::new(status, body))
}

/// An address nothing is listening on.
pub fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn read_request(stream: &TcpStream) -> Option<RecordedRequest> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).ok()?;

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}

fn write_response(mut stream: TcpStream, response: &MockResponse) {
    if !response.delay.is_zero() {
        thread::sleep(response.delay);
    }

    let reason = match response.status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    };
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n",
        response.status,
        reason,
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");

    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(response.body.as_bytes());
    let _ = stream.flush();
}
