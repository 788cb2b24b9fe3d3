//! Idle-callback scheduling.
//!
//! An [`IdleScheduler`] runs work "later": after the current task yields, with
//! no ordering guarantee relative to other scheduled work.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::core::BridgeError;

/// Deferred unit of work.
pub type IdleTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs work at some later point.
pub trait IdleScheduler: Send + Sync {
    /// Queue `task` to run later.
    fn schedule(&self, task: IdleTask);

    /// Queue a closure to run later.
    fn defer<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
        Self: Sized,
    {
        self.schedule(Box::new(f));
    }
}

/// Scheduler that runs tasks on a tokio runtime after yielding once.
#[derive(Clone)]
pub struct TokioIdleScheduler {
    handle: Arc<tokio::runtime::Handle>,
}

impl TokioIdleScheduler {
    /// Create a scheduler from a tokio runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Scheduler for the runtime the caller is running on, if any.
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl IdleScheduler for TokioIdleScheduler {
    fn schedule(&self, task: IdleTask) {
        self.handle.spawn(async move {
            tokio::task::yield_now().await;
            task();
        });
    }
}

/// Scheduler that runs tasks one by one on a dedicated background thread.
///
/// Useful where no async runtime is available. Dropping the scheduler lets
/// queued tasks finish, then the thread exits.
pub struct ThreadIdleScheduler {
    tx: Mutex<Option<Sender<IdleTask>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadIdleScheduler {
    /// Spawn the background thread.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Internal` if the thread cannot be spawned.
    pub fn new(name: &str) -> Result<Self, BridgeError> {
        let (tx, rx) = unbounded::<IdleTask>();
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for task in &rx {
                    task();
                }
                debug!("Idle scheduler thread exiting");
            })
            .map_err(|e| BridgeError::Internal(format!("failed to spawn idle thread: {e}")))?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            thread: Mutex::new(Some(thread)),
        })
    }
}

impl IdleScheduler for ThreadIdleScheduler {
    fn schedule(&self, task: IdleTask) {
        let sent = self.tx.lock().as_ref().is_some_and(|tx| tx.send(task).is_ok());
        if !sent {
            warn!("Idle scheduler is closed, dropping task");
        }
    }
}

impl Drop for ThreadIdleScheduler {
    fn drop(&mut self) {
        self.tx.lock().take();
        if let Some(thread) = self.thread.lock().take() {
            if thread.join().is_err() {
                warn!("Idle scheduler thread panicked");
            }
        }
    }
}
