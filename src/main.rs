//! `netclient`: fetch JSON over HTTP with retries, backoff, a circuit
//! breaker, and Link header pagination.
//!
//! ```text
//! netclient [OPTIONS] <URL>
//!     → config file (optional) → CLI flag overrides
//!     → AsyncClient over reqwest
//!     → pretty JSON on stdout (or --output)
//!     → events as JSON lines on stderr (--events)
//! ```
//!
//! Exit codes: 0 on success, 1 on request or output failure, 2 on usage
//! errors.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

use netclient::client::{
    AsyncClient, AsyncOptions, ClientError, ClientEvent, HookError, ReqwestTransport,
};
use netclient::config::{load_config, ClientConfig, ConfigError};
use netclient::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "netclient", version)]
#[command(about = "Fetch JSON over HTTP with retries, backoff, and pagination", long_about = None)]
struct Cli {
    /// URL to fetch
    url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Extra request header, "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    headers: Vec<String>,

    /// Request body
    #[arg(short = 'd', long)]
    data: Option<String>,

    /// Total attempts, including the first
    #[arg(long)]
    retries: Option<u32>,

    /// Retry 429 responses, honoring Retry-After
    #[arg(long = "retry-429")]
    retry_429: bool,

    /// Base backoff delay in seconds
    #[arg(long)]
    backoff_base: Option<f64>,

    /// Follow rel="next" Link headers and concatenate array pages
    #[arg(long)]
    paginate: bool,

    /// Page cap for --paginate
    #[arg(long)]
    max_pages: Option<u32>,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Header that carries the request id
    #[arg(long)]
    trace_header: Option<String>,

    /// Request id to send instead of a generated one
    #[arg(long)]
    request_id: Option<String>,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print lifecycle events as JSON lines on stderr
    #[arg(long)]
    events: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Usage(_) | Self::Config(_) => ExitCode::from(2),
            Self::Client(_) | Self::Output(_) => ExitCode::from(1),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code()
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.observability.log_level.clone());
    // Only fails if a subscriber is already installed.
    let _ = logging::init(&level, config.observability.json_logs);

    let method = Method::from_bytes(cli.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| CliError::Usage(format!("invalid method '{}'", cli.method)))?;
    if cli.paginate && (method != Method::GET || cli.data.is_some()) {
        return Err(CliError::Usage(
            "--paginate only works with GET and no request body".into(),
        ));
    }

    let client = build_client(&cli, &config)?;

    let mut options = AsyncOptions::new();
    if let Some(id) = &cli.request_id {
        options = options.with_request_id(id.clone());
    }

    let value = if cli.paginate {
        let max_pages = cli.max_pages.unwrap_or(config.pagination.max_pages);
        let items = client
            .fetch_json_array_paginated(&cli.url, max_pages, &options)
            .await?;
        Value::Array(items)
    } else {
        let body = cli.data.clone().map(String::into_bytes);
        client.request_json(method, &cli.url, body, &options).await?.body
    };

    write_output(cli.output.as_ref(), &value)?;
    Ok(())
}

fn build_client(
    cli: &Cli,
    config: &ClientConfig,
) -> Result<AsyncClient<ReqwestTransport>, CliError> {
    let mut policy = config.retry_policy();
    if let Some(retries) = cli.retries {
        policy.retries = retries;
    }
    if cli.retry_429 {
        policy.retry_on_429 = true;
    }
    if let Some(base) = cli.backoff_base {
        if !(base >= 0.0) {
            return Err(CliError::Usage(format!("--backoff-base must be >= 0, got {base}")));
        }
        policy.backoff_base = base;
    }

    let timeout = match cli.timeout {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .ok_or_else(|| CliError::Usage(format!("--timeout must be > 0, got {secs}")))?,
        None => config.request_timeout(),
    };

    let mut headers = HeaderMap::new();
    for raw in &cli.headers {
        let (name, value) = parse_header(raw)?;
        headers.append(name, value);
    }
    let json = HeaderValue::from_static("application/json");
    if !headers.contains_key(ACCEPT) {
        headers.insert(ACCEPT, json.clone());
    }
    if cli.data.is_some() && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, json);
    }

    let mut client = AsyncClient::new(ReqwestTransport::new())
        .with_policy(policy)
        .with_timeout(timeout);
    for (name, value) in &headers {
        client = client.with_default_header(name.clone(), value.clone());
    }

    if let Some(name) = cli.trace_header.as_ref().or(config.tracing.header.as_ref()) {
        client = client
            .with_trace_header(name)
            .map_err(|e| CliError::Usage(e.to_string()))?;
    }
    if let Some(breaker) = config.circuit_breaker() {
        client = client.with_breaker(Arc::new(breaker));
    }
    if cli.events {
        client = client.with_hook(Arc::new(print_event));
    }

    Ok(client)
}

/// Parse "Name: value".
fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), CliError> {
    let usage = || CliError::Usage(format!("malformed header '{raw}', expected 'Name: value'"));

    let (name, value) = raw.split_once(':').ok_or_else(usage)?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| usage())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| usage())?;
    Ok((name, value))
}

fn print_event(event: &ClientEvent) -> Result<(), HookError> {
    let line = serde_json::to_string(event)?;
    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{line}")?;
    Ok(())
}

fn write_output(path: Option<&PathBuf>, value: &Value) -> io::Result<()> {
    let mut writer: Box<dyn Write> = match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()
}
