//! Error taxonomy and the failure normalizer.
//!
//! # Design
//! `ErrorKind` is a closed set: seven generic kinds with negative codes and
//! six HTTP-status kinds whose code is the status itself. Every failure path
//! of the response pipeline funnels through [`NetworkError::normalize`], so
//! callers see one error shape whether the failure came from the transport,
//! status validation, or decoding. A server error payload
//! (`{"message": ..., "code": ...}`) in the response body overrides the
//! default message whenever it parses.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::transport::TransportError;

/// Closed set of failure kinds, each with a fixed code and description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DecoderFailure,
    MalformedUrl,
    NoData,
    RequestFailure,
    ConnectionLost,
    UnknownFailure,
    NotConnected,

    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    TimeOut,
    InternalServerError,
}

impl ErrorKind {
    /// Numeric code. Generic kinds are negative; HTTP kinds use the status.
    pub const fn code(self) -> i32 {
        match self {
            ErrorKind::DecoderFailure => -1001,
            ErrorKind::MalformedUrl => -1002,
            ErrorKind::NoData => -1003,
            ErrorKind::RequestFailure => -1004,
            ErrorKind::ConnectionLost => -1005,
            ErrorKind::UnknownFailure => -1006,
            ErrorKind::NotConnected => -1009,
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::TimeOut => 408,
            ErrorKind::InternalServerError => 500,
        }
    }

    /// Human-readable message shown to end users.
    pub const fn description(self) -> &'static str {
        match self {
            ErrorKind::ConnectionLost => {
                "The connection was lost. If you made a transaction, check your statement to see \
                 whether it completed. Otherwise, try again later."
            }
            ErrorKind::DecoderFailure | ErrorKind::RequestFailure => {
                "Sorry, something went wrong. Try again or contact our support team."
            }
            ErrorKind::NoData | ErrorKind::UnknownFailure => "An unknown error occurred.",
            ErrorKind::MalformedUrl => "The requested service is not available.",
            ErrorKind::NotConnected => "Please check your connection!",
            ErrorKind::BadRequest | ErrorKind::Unauthorized => "Incorrect service requested.",
            ErrorKind::NotFound => "The requested service could not be found.",
            ErrorKind::InternalServerError => {
                "The requested service encountered an unexpected condition."
            }
            ErrorKind::TimeOut => "The requested service did not respond.",
            ErrorKind::Forbidden => "The requested service was refused.",
        }
    }

    /// Whether this kind mirrors an HTTP status code.
    pub const fn is_http(self) -> bool {
        self.code() > 0
    }

    /// The HTTP kind for `status`, if it is one of the recognized codes.
    pub const fn from_status(status: u16) -> Option<ErrorKind> {
        match status {
            400 => Some(ErrorKind::BadRequest),
            401 => Some(ErrorKind::Unauthorized),
            403 => Some(ErrorKind::Forbidden),
            404 => Some(ErrorKind::NotFound),
            408 => Some(ErrorKind::TimeOut),
            500 => Some(ErrorKind::InternalServerError),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl std::error::Error for ErrorKind {}

/// Map a status code to success or the failure kind it represents.
///
/// 200..=299 succeed. The six recognized codes map to their HTTP kind; any
/// other status is reported as `DecoderFailure` to stay code-compatible with
/// existing consumers of this error table.
pub fn validate_status(status: u16) -> Result<(), ErrorKind> {
    match status {
        200..=299 => Ok(()),
        other => Err(ErrorKind::from_status(other).unwrap_or(ErrorKind::DecoderFailure)),
    }
}

/// What went wrong, before normalization.
#[derive(Debug)]
pub enum Cause {
    Kind(ErrorKind),
    Transport(TransportError),
    Decode(serde_json::Error),
    /// Any other failure, carried by its message.
    Other(String),
}

impl From<ErrorKind> for Cause {
    fn from(kind: ErrorKind) -> Self {
        Cause::Kind(kind)
    }
}

impl From<TransportError> for Cause {
    fn from(err: TransportError) -> Self {
        Cause::Transport(err)
    }
}

impl From<serde_json::Error> for Cause {
    fn from(err: serde_json::Error) -> Self {
        Cause::Decode(err)
    }
}

/// Error payload a server may return in the response body.
#[derive(Debug, Deserialize)]
struct ServerError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// The uniform error value delivered to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NetworkError {
    pub kind: ErrorKind,
    pub message: String,
    /// The kind's code.
    pub code: Option<i32>,
    /// Server-supplied error code from the response payload.
    pub error_code: Option<String>,
    /// HTTP status of the response, when one was received.
    pub status: Option<u16>,
}

impl NetworkError {
    /// Build the error value for `cause`, enriched by a server error payload
    /// in `body` when one parses.
    pub fn normalize(status: Option<u16>, body: Option<&[u8]>, cause: impl Into<Cause>) -> Self {
        let (kind, code, message) = match cause.into() {
            Cause::Kind(kind) => (kind, Some(kind.code()), kind.description().to_string()),
            Cause::Transport(err) => {
                let kind = err.kind();
                (kind, Some(kind.code()), kind.description().to_string())
            }
            Cause::Decode(err) => {
                debug!("decode failure: {err}");
                let kind = ErrorKind::DecoderFailure;
                (kind, Some(kind.code()), kind.description().to_string())
            }
            Cause::Other(message) => {
                let kind = ErrorKind::UnknownFailure;
                (kind, Some(kind.code()), message)
            }
        };

        let mut error = NetworkError {
            kind,
            message,
            code,
            error_code: None,
            status,
        };

        if let Some(payload) = body.and_then(|bytes| serde_json::from_slice::<ServerError>(bytes).ok()) {
            error.message = payload.message;
            error.error_code = payload.code;
        }
        error
    }

    /// An error carrying a caller-chosen message and no server payload.
    pub fn with_message(code: Option<i32>, message: impl Into<String>) -> Self {
        NetworkError {
            kind: ErrorKind::UnknownFailure,
            message: message.into(),
            code,
            error_code: None,
            status: None,
        }
    }
}

impl From<ErrorKind> for NetworkError {
    fn from(kind: ErrorKind) -> Self {
        NetworkError::normalize(None, None, kind)
    }
}

/// Invalid request configuration. Never recoverable by retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("the stub provider requires a fixture bundle")]
    MissingBundle,
}
