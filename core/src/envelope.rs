//! Decoding of the `{ok, result, description, error_code, parameters}`
//! wrapper every bot API response uses.
//!
//! # Design
//! The HTTP status is checked first; a non-2xx answer becomes
//! `ApiError::HttpError` and its body is never parsed, because error pages
//! are not guaranteed to be JSON. Only then is the envelope decoded, and
//! `result` is converted into the caller's type as a separate step so a
//! shape mismatch is reported as `DeserializationError`, not as a bad
//! envelope.

use std::io::Read;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Hints attached to some remote failures. Never acted upon automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// The response wrapper.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

impl Envelope {
    /// Read one envelope from `reader`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ApiError> {
        serde_json::from_reader(reader).map_err(ApiError::EnvelopeError)
    }

    /// Convert into the typed result, or the remote failure.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        if !self.ok {
            return Err(ApiError::RemoteError {
                description: self.description.unwrap_or_default(),
                error_code: self.error_code.unwrap_or_default(),
                parameters: self.parameters,
            });
        }
        serde_json::from_value(self.result).map_err(ApiError::DeserializationError)
    }
}

/// Turn a raw response into the caller's type.
pub fn decode_response<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(ApiError::HttpError {
            status: response.status,
            reason: response.reason.clone(),
        });
    }
    Envelope::from_reader(response.body.as_slice())?.into_result()
}
