//! The isolated side of a bridge and the listener that settles responses.
//!
//! The worker is a dedicated OS thread with its own single-threaded tokio
//! runtime. It shares nothing mutable with the caller: requests arrive on one
//! channel, responses leave on another.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use futures::FutureExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info};

use crate::core::callback::CallbackRegistry;
use crate::core::error::{BridgeError, CallbackError};
use crate::core::protocol::{WorkerRequest, WorkerResponse};

use super::pending::PendingTable;
use super::{settle_response, BridgeCounters};

/// Everything the worker thread owns.
pub(super) struct WorkerContext {
    pub registry: CallbackRegistry,
    pub callback: String,
    pub requests: UnboundedReceiver<WorkerRequest>,
    pub responses: Sender<WorkerResponse>,
    pub terminated: Arc<AtomicBool>,
}

/// Spawn the worker thread.
pub(super) fn spawn_worker(
    name: &str,
    stack_size: usize,
    ctx: WorkerContext,
) -> Result<JoinHandle<()>, BridgeError> {
    thread::Builder::new()
        .name(name.to_string())
        .stack_size(stack_size)
        .spawn(move || run_worker(ctx))
        .map_err(|e| BridgeError::Internal(format!("failed to spawn worker thread: {e}")))
}

fn run_worker(ctx: WorkerContext) {
    let WorkerContext {
        registry,
        callback: callback_name,
        mut requests,
        responses,
        terminated,
    } = ctx;

    debug!(callback = %callback_name, "Worker thread started");

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(callback = %callback_name, error = %e, "Failed to create worker runtime");
            let failure = CallbackError::new(format!("worker runtime unavailable: {e}"));
            while let Some(request) = requests.blocking_recv() {
                let _ = responses.send(WorkerResponse::failure(request.id, &failure));
            }
            return;
        }
    };

    // Built once, before any request is read.
    let callback = registry.instantiate(&callback_name);
    if let Err(e) = &callback {
        error!(callback = %callback_name, error = %e, "Worker callback construction failed");
    }

    rt.block_on(async {
        while let Some(request) = requests.recv().await {
            if terminated.load(Ordering::Acquire) {
                break;
            }

            let id = request.id;
            match &callback {
                Ok(cb) => {
                    let cb = Arc::clone(cb);
                    let responses = responses.clone();
                    let terminated = Arc::clone(&terminated);

                    tokio::spawn(async move {
                        let outcome = AssertUnwindSafe(cb.invoke(request.payload, request.transfer))
                            .catch_unwind()
                            .await;

                        let response = match outcome {
                            Ok(Ok(value)) => WorkerResponse::success(id, value),
                            Ok(Err(err)) => WorkerResponse::failure(id, &err),
                            Err(_) => {
                                error!(id = %id, "Worker callback panicked");
                                WorkerResponse::failure(id, &CallbackError::new("callback panicked"))
                            }
                        };

                        if terminated.load(Ordering::Acquire) {
                            return;
                        }
                        let _ = responses.send(response);
                    });
                }
                Err(e) => {
                    let _ = responses.send(WorkerResponse::failure(id, &CallbackError::new(e.to_string())));
                }
            }
        }
    });

    // Abandon whatever is still in flight.
    rt.shutdown_background();
    debug!(callback = %callback_name, "Worker thread exiting");
}

/// Spawn the listener thread that matches responses to pending requests.
///
/// It exits once the worker and every task holding a response sender are gone.
pub(super) fn spawn_listener(
    name: &str,
    responses: Receiver<WorkerResponse>,
    pending: Arc<PendingTable>,
    counters: Arc<BridgeCounters>,
) -> Result<JoinHandle<()>, BridgeError> {
    thread::Builder::new()
        .name(format!("{name}-listener"))
        .spawn(move || {
            for response in &responses {
                settle_response(&pending, &counters, response);
            }
            info!("Bridge listener exiting");
        })
        .map_err(|e| BridgeError::Internal(format!("failed to spawn listener thread: {e}")))
}
