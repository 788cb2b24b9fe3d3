//! Core bridge abstractions: settlement, protocol, callbacks and the bridge itself.

pub mod bridge;
pub mod callback;
pub mod deferred;
pub mod error;
pub mod protocol;

pub use bridge::{BridgeStats, CallHandle, CallOptions, WorkerBridge};
pub use callback::{from_fn, register_callback, CallbackRegistry, FnCallback, WorkerCallback};
pub use deferred::{Deferred, DeferredState};
pub use error::{AppResult, BridgeError, CallbackError};
pub use protocol::{CorrelationId, TransferList, WorkerRequest, WorkerResponse};
