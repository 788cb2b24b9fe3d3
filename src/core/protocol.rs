//! Wire messages exchanged between a bridge and its worker.
//!
//! The correlation id travels with the request and is echoed in the response.
//! Payloads are plain data (`serde_json::Value`); nothing live crosses the
//! boundary except transferred buffers, which are moved rather than copied.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::CallbackError;

/// Integer tag linking a dispatched request to its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub u64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resources handed to the worker by ownership transfer.
///
/// Buffers are moved into the request, so the caller gives them up and the
/// worker receives the same allocations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransferList {
    buffers: Vec<Vec<u8>>,
}

impl TransferList {
    /// An empty transfer list.
    #[must_use]
    pub const fn new() -> Self {
        Self { buffers: Vec::new() }
    }

    /// Append a buffer.
    pub fn push(&mut self, buffer: Vec<u8>) {
        self.buffers.push(buffer);
    }

    /// Number of buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether the list holds no buffers.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Borrow the buffers.
    pub fn buffers(&self) -> &[Vec<u8>] {
        &self.buffers
    }

    /// Take ownership of the buffers.
    pub fn into_buffers(self) -> Vec<Vec<u8>> {
        self.buffers
    }
}

impl From<Vec<Vec<u8>>> for TransferList {
    fn from(buffers: Vec<Vec<u8>>) -> Self {
        Self { buffers }
    }
}

impl FromIterator<Vec<u8>> for TransferList {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        Self {
            buffers: iter.into_iter().collect(),
        }
    }
}

/// Request from bridge to worker.
#[derive(Debug)]
pub struct WorkerRequest {
    /// Correlation id to echo back.
    pub id: CorrelationId,
    /// Serialized callback argument.
    pub payload: serde_json::Value,
    /// Buffers moved alongside the payload.
    pub transfer: TransferList,
}

/// Response from worker to bridge, serialized as `[id, success, payload]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(CorrelationId, bool, serde_json::Value)")]
#[serde(into = "(CorrelationId, bool, serde_json::Value)")]
pub struct WorkerResponse {
    /// Correlation id of the originating request.
    pub id: CorrelationId,
    /// Whether the callback succeeded.
    pub success: bool,
    /// Result on success, encoded [`CallbackError`] on failure.
    pub payload: serde_json::Value,
}

impl WorkerResponse {
    /// Successful response carrying `result`.
    pub const fn success(id: CorrelationId, result: serde_json::Value) -> Self {
        Self {
            id,
            success: true,
            payload: result,
        }
    }

    /// Failed response carrying `error` as plain data.
    pub fn failure(id: CorrelationId, error: &CallbackError) -> Self {
        Self {
            id,
            success: false,
            payload: error.to_payload(),
        }
    }
}

impl From<(CorrelationId, bool, serde_json::Value)> for WorkerResponse {
    fn from((id, success, payload): (CorrelationId, bool, serde_json::Value)) -> Self {
        Self { id, success, payload }
    }
}

impl From<WorkerResponse> for (CorrelationId, bool, serde_json::Value) {
    fn from(resp: WorkerResponse) -> Self {
        (resp.id, resp.success, resp.payload)
    }
}
