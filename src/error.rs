use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("missing required configuration field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid configuration for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("configuration error: {0}")]
    Other(String),
}

/// Failures turning a raw syslog message into a renderable envelope.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("message does not contain a JSON fragment")]
    NoJson,
    #[error("invalid JSON after repair: {message}")]
    Syntax { message: String },
    #[error("missing field in alarm payload: {field}")]
    MissingField { field: &'static str },
    #[error("invalid field {field} in alarm payload: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("alarm payload contains no records to notify")]
    NoRecords,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to build HTTP client")]
    Client {
        #[source]
        source: reqwest::Error,
    },
    #[error("request failed: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected HTTP status {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("webhook rejected message with code {code}: {message}")]
    Rejected { code: i64, message: String },
    #[error("failed to key webhook signature: {message}")]
    Signing { message: String },
    #[error("retry budget exhausted")]
    RetryExhausted {
        #[source]
        source: Box<DispatchError>,
    },
}

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind to listen address {address}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to query bound address")]
    LocalAddr {
        #[source]
        source: std::io::Error,
    },
    #[error("failed to accept connection")]
    Accept {
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read from {peer}")]
    Read {
        peer: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("message from {peer} is not valid UTF-8")]
    Decode {
        peer: SocketAddr,
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("no data received from {peer} before timeout")]
    Idle { peer: SocketAddr },
}

impl From<reqwest::Error> for DispatchError {
    fn from(source: reqwest::Error) -> Self {
        Self::Request { source }
    }
}

impl DispatchError {
    /// Transport failures and server-side statuses may succeed on a later attempt.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Request { .. } => true,
            Self::HttpStatus { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::REQUEST_TIMEOUT
            }
            _ => false,
        }
    }
}

impl Error {
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Dispatch(err) if err.is_retriable())
    }
}
