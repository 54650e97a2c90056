//! Error types shared by the storage, transport and session layers.

use serde_json::Value;
use thiserror::Error;

use crate::utils::value::value_to_string;

/// Failures of a single storage tier. The token store logs these and falls
/// back to "absent", so they never reach session callers.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not a valid key/value document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Body of a failed HTTP response, kept both raw and (when possible) parsed.
#[derive(Debug, Clone, Default)]
pub struct ErrorPayload {
    pub raw: String,
    pub json: Option<Value>,
}

impl ErrorPayload {
    pub fn new(raw: String) -> Self {
        let json = serde_json::from_str::<Value>(&raw).ok();
        Self { raw, json }
    }

    /// The structured `detail` field the identity service puts on its errors.
    pub fn detail(&self) -> Option<String> {
        self.json
            .as_ref()
            .and_then(|v| v.get("detail"))
            .filter(|v| !v.is_null())
            .cloned()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
    }

    /// Most specific message available: `detail`, then the body itself.
    /// JSON objects without `detail` are rendered back to JSON text.
    pub fn describe(&self) -> Option<String> {
        if let Some(detail) = self.detail() {
            return Some(detail);
        }
        match &self.json {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(other @ (Value::Object(_) | Value::Array(_))) => Some(other.to_string()),
            _ => {
                let trimmed = self.raw.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

/// Errors produced by the authenticated transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response was received at all.
    #[error("no response from server: {0}")]
    Network(String),

    /// The request could not be built (bad URL, unserializable body).
    #[error("invalid request: {0}")]
    Request(String),

    /// The server answered 401.
    #[error("unauthorized")]
    Unauthorized(ErrorPayload),

    /// Any other non-success status.
    #[error("request failed with status {status}")]
    Status { status: u16, payload: ErrorPayload },

    /// A success response whose body did not match the expected shape.
    #[error("could not decode response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// The response body, when the server answered at all.
    pub fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            TransportError::Unauthorized(payload) => Some(payload),
            TransportError::Status { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Unauthorized(_) => Some(401),
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, TransportError::Network(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            TransportError::Request(e.to_string())
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// Errors surfaced by the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The profile could not be fetched although a token was present.
    /// The session has already been logged out when this is returned.
    #[error("failed to fetch user profile: {0}")]
    ProfileFetch(#[source] TransportError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
