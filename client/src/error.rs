use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// A custom error type for the TextSynth API client.
///
/// Every variant carries the message returned by the server when one was
/// available, so callers can show it as-is.
#[derive(Error, Debug)]
pub enum TextSynthError {
    /// The client was set up incorrectly (no secret key, bad host, ...).
    /// Raised locally, never reaches the network.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Request parameters were rejected, either locally or by the server (HTTP 400).
    #[error("validation error: {0}")]
    Validation(String),
    /// The secret key is missing or was refused (HTTP 401/403).
    #[error("authentication error: {0}")]
    Authentication(String),
    /// The server does not know the requested engine (HTTP 404).
    #[error("unknown engine: {0}")]
    UnknownEngine(String),
    /// The account is being rate limited (HTTP 429).
    #[error("rate limited: {message}")]
    RateLimited {
        /// Seconds to wait, from the `Retry-After` header.
        retry_after: Option<u64>,
        message: String,
    },
    /// The server failed to process the request (HTTP 5xx or an unexpected status).
    #[error("service error ({status}): {message}")]
    Service { status: StatusCode, message: String },
    /// The request timed out before a response arrived.
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    /// The request could not be delivered.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    /// The response body did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// The class of a [`TextSynthError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Authentication,
    UnknownEngine,
    RateLimited,
    Service,
    Timeout,
    Network,
    Protocol,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Validation => "validation",
            ErrorKind::Authentication => "authentication",
            ErrorKind::UnknownEngine => "unknown_engine",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Service => "service",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::Protocol => "protocol",
        };
        f.write_str(name)
    }
}

/// Error body sent by the server, e.g. `{"status": 400, "error": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl TextSynthError {
    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TextSynthError::Configuration(_) => ErrorKind::Configuration,
            TextSynthError::Validation(_) => ErrorKind::Validation,
            TextSynthError::Authentication(_) => ErrorKind::Authentication,
            TextSynthError::UnknownEngine(_) => ErrorKind::UnknownEngine,
            TextSynthError::RateLimited { .. } => ErrorKind::RateLimited,
            TextSynthError::Service { .. } => ErrorKind::Service,
            TextSynthError::Timeout(_) => ErrorKind::Timeout,
            TextSynthError::Network(_) => ErrorKind::Network,
            TextSynthError::Protocol(_) => ErrorKind::Protocol,
        }
    }

    /// Builds a validation error for a single parameter.
    pub(crate) fn invalid(parameter: &str, reason: impl fmt::Display) -> Self {
        TextSynthError::Validation(format!("invalid parameter '{parameter}': {reason}"))
    }

    /// Classifies a non-success HTTP status.
    ///
    /// `body` is the raw response body; its `error` field is used as the
    /// message when it parses, the whole text otherwise.
    pub(crate) fn from_status(status: StatusCode, retry_after: Option<u64>, body: &str) -> Self {
        let message = server_message(status, body);
        match status {
            StatusCode::BAD_REQUEST => TextSynthError::Validation(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                TextSynthError::Authentication(message)
            }
            StatusCode::NOT_FOUND => TextSynthError::UnknownEngine(message),
            StatusCode::TOO_MANY_REQUESTS => TextSynthError::RateLimited {
                retry_after,
                message,
            },
            _ => TextSynthError::Service { status, message },
        }
    }
}

fn server_message(status: StatusCode, body: &str) -> String {
    if let Ok(ErrorBody { error }) = serde_json::from_str(body) {
        return error;
    }
    let body = body.trim();
    if body.is_empty() {
        format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string()
    } else {
        body.to_string()
    }
}

impl From<reqwest::Error> for TextSynthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TextSynthError::Timeout(err)
        } else if err.is_decode() {
            TextSynthError::Protocol(err.to_string())
        } else if err.is_builder() {
            TextSynthError::Configuration(err.to_string())
        } else {
            TextSynthError::Network(err)
        }
    }
}

impl From<serde_json::Error> for TextSynthError {
    fn from(err: serde_json::Error) -> Self {
        TextSynthError::Protocol(err.to_string())
    }
}

pub type Result<T, E = TextSynthError> = std::result::Result<T, E>;
