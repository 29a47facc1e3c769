//! Error types for the bot API client.
//!
//! # Design
//! Each variant corresponds to one place a call can fail: the network stack,
//! the HTTP status line, the response envelope, the remote service itself,
//! the typed result, or a local attachment. Callers can tell "the call
//! failed remotely" (`RemoteError`) apart from "the call succeeded remotely
//! but the result did not parse" (`DeserializationError`).

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::envelope::ResponseParameters;

/// Errors returned by `Client` operations.
#[derive(Debug)]
pub enum ApiError {
    /// Connection, DNS, TLS or timeout failure, as reported by the HTTP stack.
    TransportError(ureq::Error),

    /// The server answered with a non-2xx status. The body is never parsed.
    HttpError { status: u16, reason: String },

    /// The response body is not a valid envelope.
    EnvelopeError(serde_json::Error),

    /// The envelope reported `ok: false`.
    RemoteError {
        description: String,
        error_code: i64,
        parameters: Option<ResponseParameters>,
    },

    /// The envelope reported success but `result` did not match the
    /// requested type.
    DeserializationError(serde_json::Error),

    /// A parameter payload (reply markup) could not be serialized to JSON.
    SerializationError(serde_json::Error),

    /// An attachment could not be opened or read.
    FileError { path: PathBuf, source: io::Error },
}

impl ApiError {
    /// Retry delay suggested by the remote service, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RemoteError {
                parameters: Some(parameters),
                ..
            } => parameters.retry_after.map(Duration::from_secs),
            _ => None,
        }
    }

    /// Supergroup the chat was migrated to, if the remote service says so.
    pub fn migrate_to_chat_id(&self) -> Option<i64> {
        match self {
            ApiError::RemoteError {
                parameters: Some(parameters),
                ..
            } => parameters.migrate_to_chat_id,
            _ => None,
        }
    }

    /// Numeric error code of a remote failure.
    pub fn error_code(&self) -> Option<i64> {
        match self {
            ApiError::RemoteError { error_code, .. } => Some(*error_code),
            _ => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ApiError::RemoteError { .. })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::TransportError(err) => write!(f, "{err}"),
            ApiError::HttpError { status, reason } => {
                if reason.is_empty() {
                    write!(f, "{status}")
                } else {
                    write!(f, "{status} {reason}")
                }
            }
            ApiError::EnvelopeError(err) => write!(f, "unable to decode response: {err}"),
            // The remote description is reported verbatim.
            ApiError::RemoteError { description, .. } => f.write_str(description),
            ApiError::DeserializationError(err) => write!(f, "unable to decode result: {err}"),
            ApiError::SerializationError(err) => write!(f, "unable to encode parameter: {err}"),
            ApiError::FileError { path, source } => {
                write!(f, "unable to read attachment {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::TransportError(err) => Some(err),
            ApiError::EnvelopeError(err)
            | ApiError::DeserializationError(err)
            | ApiError::SerializationError(err) => Some(err),
            ApiError::FileError { source, .. } => Some(source),
            ApiError::HttpError { .. } | ApiError::RemoteError { .. } => None,
        }
    }
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        ApiError::TransportError(err)
    }
}
