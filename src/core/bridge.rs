//! RPC bridge to a single isolated worker thread.
//!
//! A [`WorkerBridge`] dispatches requests to its worker, tags each one with a
//! correlation id, and settles the matching [`Deferred`] when the response
//! comes back. Calls made with [`CallOptions::sync`] skip the worker and run
//! the same callback in-process.
//!
//! # Example
//!
//! ```rust,ignore
//! use worker_bridge::config::BridgeConfig;
//! use worker_bridge::core::{from_fn, register_callback, CallOptions, CallbackError, WorkerBridge};
//!
//! register_callback("double", || Ok(from_fn(|n: i64| async move { Ok::<_, CallbackError>(n * 2) })));
//!
//! let bridge: WorkerBridge<i64, i64> = WorkerBridge::new(BridgeConfig::new("double"))?;
//! assert_eq!(bridge.call(21, CallOptions::default())?.await?, 42);
//! assert_eq!(bridge.call(21, CallOptions::sync())?.await?, 42);
//! ```

mod pending;
mod worker;

use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread::JoinHandle;

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::config::{BridgeConfig, TeardownPolicy};
use crate::core::callback::{CallbackRegistry, ErasedCallback};
use crate::core::deferred::Deferred;
use crate::core::error::{BridgeError, CallbackError};
use crate::core::protocol::{CorrelationId, TransferList, WorkerRequest, WorkerResponse};

use pending::PendingTable;
use worker::{spawn_listener, spawn_worker, WorkerContext};

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Buffers moved to the callback alongside the input.
    pub transfer: TransferList,
    /// Run the callback in the caller's context instead of the worker.
    pub sync: bool,
}

impl CallOptions {
    /// Options for an in-process call.
    #[must_use]
    pub fn sync() -> Self {
        Self {
            sync: true,
            ..Self::default()
        }
    }

    /// Attach a transfer list.
    #[must_use]
    pub fn with_transfer(mut self, transfer: impl Into<TransferList>) -> Self {
        self.transfer = transfer.into();
        self
    }
}

/// Statistics about bridge traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Requests sent to the worker.
    pub dispatched: u64,
    /// Requests settled with a value.
    pub fulfilled: u64,
    /// Requests settled with an error.
    pub rejected: u64,
    /// Responses with no matching pending request.
    pub unmatched_responses: u64,
    /// Requests dropped unsettled by `destroy()`.
    pub abandoned: u64,
    /// Calls served in-process.
    pub sync_calls: u64,
    /// Requests currently awaiting a response.
    pub pending: usize,
}

/// Internal counters for bridge statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct BridgeCounters {
    pub dispatched: AtomicU64,
    pub fulfilled: AtomicU64,
    pub rejected: AtomicU64,
    pub unmatched_responses: AtomicU64,
    pub abandoned: AtomicU64,
    pub sync_calls: AtomicU64,
}

impl BridgeCounters {
    fn snapshot(&self, pending: usize) -> BridgeStats {
        BridgeStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            fulfilled: self.fulfilled.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            unmatched_responses: self.unmatched_responses.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            sync_calls: self.sync_calls.load(Ordering::Relaxed),
            pending,
        }
    }
}

/// Match a response to its pending request and settle it.
///
/// Unknown ids (already settled, abandoned, never issued) are dropped.
pub(crate) fn settle_response(pending: &PendingTable, counters: &BridgeCounters, response: WorkerResponse) {
    let WorkerResponse { id, success, payload } = response;

    let Some(deferred) = pending.remove(id) else {
        counters.unmatched_responses.fetch_add(1, Ordering::Relaxed);
        debug!(id = %id, "Dropping response with no pending request");
        return;
    };

    // Counted before settling so a woken caller sees its own request in stats.
    if success {
        counters.fulfilled.fetch_add(1, Ordering::Relaxed);
        deferred.resolve(payload);
        debug!(id = %id, "Request fulfilled");
    } else {
        let err = CallbackError::from_payload(payload);
        let message = err.message.clone();
        counters.rejected.fetch_add(1, Ordering::Relaxed);
        deferred.reject(BridgeError::Callback(err));
        debug!(id = %id, error = %message, "Request rejected");
    }
}

/// Awaitable result of [`WorkerBridge::call`].
///
/// Dropping the handle does not withdraw a dispatched request.
#[must_use = "a call handle does nothing unless awaited"]
pub struct CallHandle<O> {
    id: Option<CorrelationId>,
    inner: BoxFuture<'static, Result<serde_json::Value, BridgeError>>,
    _output: PhantomData<fn() -> O>,
}

impl<O> CallHandle<O> {
    /// Correlation id of a dispatched request; `None` for in-process calls.
    pub const fn id(&self) -> Option<CorrelationId> {
        self.id
    }
}

impl<O> std::fmt::Debug for CallHandle<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallHandle").field("id", &self.id).finish_non_exhaustive()
    }
}

impl<O: DeserializeOwned> Future for CallHandle<O> {
    type Output = Result<O, BridgeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner
            .as_mut()
            .poll(cx)
            .map(|res| res.and_then(|value| serde_json::from_value(value).map_err(BridgeError::from)))
    }
}

/// Bridge owning one worker thread and the table of its in-flight requests.
///
/// `I` is the callback input and `O` its output; both cross the boundary as
/// plain data.
pub struct WorkerBridge<I, O> {
    config: BridgeConfig,
    registry: CallbackRegistry,
    /// Request sender. `None` once destroyed.
    requests: Mutex<Option<UnboundedSender<WorkerRequest>>>,
    pending: Arc<PendingTable>,
    counters: Arc<BridgeCounters>,
    next_id: AtomicU64,
    terminated: Arc<AtomicBool>,
    /// Callback for sync calls, built on first use.
    local: Mutex<Option<Arc<dyn ErasedCallback>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    _types: PhantomData<fn(I) -> O>,
}

impl<I, O> WorkerBridge<I, O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    /// Create a bridge running a callback from the global registry.
    ///
    /// # Errors
    ///
    /// - `BridgeError::InvalidConfig` if the configuration is invalid
    /// - `BridgeError::UnknownCallback` if nothing is registered under `config.callback`
    /// - `BridgeError::Internal` if the worker or listener thread cannot be spawned
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        Self::with_registry(config, CallbackRegistry::global().clone())
    }

    /// Create a bridge running a callback from `registry`.
    ///
    /// # Errors
    ///
    /// Same as [`WorkerBridge::new`].
    pub fn with_registry(config: BridgeConfig, registry: CallbackRegistry) -> Result<Self, BridgeError> {
        config.validate().map_err(BridgeError::InvalidConfig)?;
        if !registry.contains(&config.callback) {
            return Err(BridgeError::UnknownCallback(config.callback));
        }

        let (request_tx, request_rx) = tokio::sync::mpsc::unbounded_channel();
        let (response_tx, response_rx) = crossbeam_channel::unbounded();
        let pending = Arc::new(PendingTable::new());
        let counters = Arc::new(BridgeCounters::default());
        let terminated = Arc::new(AtomicBool::new(false));

        let worker = spawn_worker(
            &config.thread_name,
            config.thread_stack_size,
            WorkerContext {
                registry: registry.clone(),
                callback: config.callback.clone(),
                requests: request_rx,
                responses: response_tx,
                terminated: Arc::clone(&terminated),
            },
        )?;

        // The listener is detached; it exits when the worker side hangs up.
        spawn_listener(
            &config.thread_name,
            response_rx,
            Arc::clone(&pending),
            Arc::clone(&counters),
        )?;

        info!(
            callback = %config.callback,
            worker = %config.thread_name,
            teardown = ?config.teardown,
            "WorkerBridge started"
        );

        Ok(Self {
            config,
            registry,
            requests: Mutex::new(Some(request_tx)),
            pending,
            counters,
            next_id: AtomicU64::new(0),
            terminated,
            local: Mutex::new(None),
            worker: Mutex::new(Some(worker)),
            _types: PhantomData,
        })
    }

    /// Invoke the callback with `input`.
    ///
    /// On the worker path this dispatches immediately and returns without
    /// blocking; the result arrives when the handle is awaited. With
    /// `options.sync` the callback runs in the caller's context.
    ///
    /// # Errors
    ///
    /// - `BridgeError::Serialization` if `input` cannot be encoded
    /// - `BridgeError::Destroyed` for worker calls after [`destroy`](Self::destroy)
    /// - `BridgeError::Construction` if a sync call cannot build the callback
    pub fn call(&self, input: I, options: CallOptions) -> Result<CallHandle<O>, BridgeError> {
        let payload = serde_json::to_value(&input)?;
        if options.sync {
            return self.call_local(payload, options.transfer);
        }

        if self.terminated.load(Ordering::Acquire) {
            return Err(BridgeError::Destroyed);
        }

        // Insert and send under the sender lock so `destroy` either sees the
        // entry when it drains or has already taken the sender.
        let requests = self.requests.lock();
        let Some(tx) = requests.as_ref() else {
            return Err(BridgeError::Destroyed);
        };

        let id = CorrelationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let deferred = Deferred::new();
        let future = deferred.future();
        self.pending.insert(id, deferred);

        let request = WorkerRequest {
            id,
            payload,
            transfer: options.transfer,
        };
        if tx.send(request).is_err() {
            self.pending.remove(id);
            return Err(BridgeError::Destroyed);
        }
        drop(requests);

        self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
        debug!(id = %id, callback = %self.config.callback, "Request dispatched");

        Ok(CallHandle {
            id: Some(id),
            inner: future.boxed(),
            _output: PhantomData,
        })
    }

    /// Dispatch to the worker and await the result.
    ///
    /// # Errors
    ///
    /// Any error from [`call`](Self::call) or from the callback.
    pub async fn invoke(&self, input: I) -> Result<O, BridgeError> {
        self.call(input, CallOptions::default())?.await
    }

    fn call_local(&self, payload: serde_json::Value, transfer: TransferList) -> Result<CallHandle<O>, BridgeError> {
        let callback = self.local_callback()?;
        self.counters.sync_calls.fetch_add(1, Ordering::Relaxed);

        let inner = async move {
            match AssertUnwindSafe(callback.invoke(payload, transfer))
                .catch_unwind()
                .await
            {
                Ok(result) => result.map_err(BridgeError::Callback),
                Err(_) => {
                    error!("In-process callback panicked");
                    Err(BridgeError::Callback(CallbackError::new("callback panicked")))
                }
            }
        };
        Ok(CallHandle {
            id: None,
            inner: inner.boxed(),
            _output: PhantomData,
        })
    }

    /// Callback for sync calls. A failed construction is not cached.
    fn local_callback(&self) -> Result<Arc<dyn ErasedCallback>, BridgeError> {
        let mut slot = self.local.lock();
        if let Some(callback) = slot.as_ref() {
            return Ok(Arc::clone(callback));
        }
        let callback = self.registry.instantiate(&self.config.callback)?;
        debug!(callback = %self.config.callback, "In-process callback constructed");
        *slot = Some(Arc::clone(&callback));
        Ok(callback)
    }

    /// Feed a response through the same path the listener uses.
    ///
    /// Responses whose id is not pending are dropped without error.
    pub fn handle_response(&self, response: WorkerResponse) {
        settle_response(&self.pending, &self.counters, response);
    }
}

impl<I, O> WorkerBridge<I, O> {
    /// Tear down the worker and clear the pending table.
    ///
    /// Outstanding requests are abandoned or rejected according to the
    /// configured [`TeardownPolicy`]. Safe to call more than once.
    pub fn destroy(&self) {
        let first = !self.terminated.swap(true, Ordering::AcqRel);

        // Closing the request channel stops the worker loop. Taken before the
        // drain so no call can insert behind it.
        self.requests.lock().take();

        let outstanding = self.pending.drain();
        if !outstanding.is_empty() {
            match self.config.teardown {
                TeardownPolicy::Abandon => {
                    self.counters
                        .abandoned
                        .fetch_add(outstanding.len() as u64, Ordering::Relaxed);
                    warn!(count = outstanding.len(), "Abandoning pending requests on teardown");
                }
                TeardownPolicy::Reject => {
                    self.counters
                        .rejected
                        .fetch_add(outstanding.len() as u64, Ordering::Relaxed);
                    for (_, deferred) in &outstanding {
                        deferred.reject(BridgeError::Destroyed);
                    }
                    info!(count = outstanding.len(), "Rejected pending requests on teardown");
                }
            }
        }

        if !first {
            return;
        }

        // The worker exits on its own once the channel drains; never block here.
        if self.worker.lock().take().is_some() {
            debug!(worker = %self.config.thread_name, "Worker thread detached");
        }

        info!(callback = %self.config.callback, "WorkerBridge destroyed");
    }

    /// Whether [`destroy`](Self::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Number of requests awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether `id` is awaiting a response.
    pub fn is_pending(&self, id: CorrelationId) -> bool {
        self.pending.contains(id)
    }

    /// Name of the callback this bridge runs.
    pub fn callback_name(&self) -> &str {
        &self.config.callback
    }

    /// Current traffic statistics.
    #[must_use]
    pub fn stats(&self) -> BridgeStats {
        self.counters.snapshot(self.pending.len())
    }
}

impl<I, O> Drop for WorkerBridge<I, O> {
    fn drop(&mut self) {
        self.destroy();
    }
}
