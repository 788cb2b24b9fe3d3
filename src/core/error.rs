//! Error types for bridge operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a worker callback.
///
/// Errors cross the isolation boundary as plain data, so only the message and
/// an optional JSON payload survive the trip.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct CallbackError {
    /// Human-readable failure message.
    pub message: String,
    /// Optional structured detail supplied by the callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CallbackError {
    /// Create a callback error with a message and no detail.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured detail to the error.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Rebuild a callback error from a failure payload received off the wire.
    ///
    /// Payloads that are not a serialized `CallbackError` are kept verbatim as
    /// detail, with a message derived from the value itself.
    pub fn from_payload(payload: serde_json::Value) -> Self {
        match serde_json::from_value::<Self>(payload.clone()) {
            Ok(err) => err,
            Err(_) => {
                let message = match &payload {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Self {
                    message,
                    data: Some(payload),
                }
            }
        }
    }

    /// Encode the error as a failure payload.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::Value::String(self.message.clone()))
    }
}

/// Errors produced by bridge components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The callback failed while handling a request.
    #[error("callback failed: {0}")]
    Callback(CallbackError),
    /// The callback factory failed to produce a callback.
    #[error("callback construction failed: {0}")]
    Construction(String),
    /// No callback is registered under the configured name.
    #[error("unknown callback: {0}")]
    UnknownCallback(String),
    /// The bridge has been destroyed.
    #[error("bridge destroyed")]
    Destroyed,
    /// A payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Internal failure (thread spawn, runtime setup, closed channel).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<CallbackError> for BridgeError {
    fn from(err: CallbackError) -> Self {
        Self::Callback(err)
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
