//! Single-shot settlement primitive.
//!
//! A [`Deferred`] couples an eventual value with externally callable
//! `resolve`/`reject` operations. Exactly one settlement takes effect; later
//! attempts are ignored. Any number of readers may await the outcome through
//! [`Deferred::future`].

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::error::BridgeError;

/// Settlement state of a [`Deferred`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredState {
    /// Not yet settled.
    Pending,
    /// Settled with a value.
    Fulfilled,
    /// Settled with an error.
    Rejected,
}

enum Settlement<T> {
    Pending,
    Fulfilled(T),
    Rejected(BridgeError),
}

struct Shared<T> {
    settlement: Mutex<Settlement<T>>,
    notify: Notify,
}

/// A future value with external resolve/reject.
///
/// Cloning a `Deferred` yields another handle to the same settlement.
pub struct Deferred<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred").field("state", &self.state()).finish()
    }
}

impl<T> Deferred<T> {
    /// Create a pending deferred.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                settlement: Mutex::new(Settlement::Pending),
                notify: Notify::new(),
            }),
        }
    }

    /// Fulfil with `value`. Returns `false` if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Settlement::Fulfilled(value))
    }

    /// Reject with `error`. Returns `false` if already settled.
    pub fn reject(&self, error: BridgeError) -> bool {
        self.settle(Settlement::Rejected(error))
    }

    fn settle(&self, outcome: Settlement<T>) -> bool {
        {
            let mut settlement = self.shared.settlement.lock();
            if !matches!(*settlement, Settlement::Pending) {
                return false;
            }
            *settlement = outcome;
        }
        self.shared.notify.notify_waiters();
        true
    }

    /// Current settlement state.
    pub fn state(&self) -> DeferredState {
        match *self.shared.settlement.lock() {
            Settlement::Pending => DeferredState::Pending,
            Settlement::Fulfilled(_) => DeferredState::Fulfilled,
            Settlement::Rejected(_) => DeferredState::Rejected,
        }
    }

    /// Whether `resolve` or `reject` has taken effect.
    pub fn is_settled(&self) -> bool {
        self.state() != DeferredState::Pending
    }
}

impl<T: Clone> Deferred<T> {
    /// Peek at the outcome without waiting. `None` while pending.
    pub fn try_result(&self) -> Option<Result<T, BridgeError>> {
        match &*self.shared.settlement.lock() {
            Settlement::Pending => None,
            Settlement::Fulfilled(value) => Some(Ok(value.clone())),
            Settlement::Rejected(err) => Some(Err(err.clone())),
        }
    }

    /// Wait for settlement and yield the value or the rejection.
    ///
    /// The returned future holds its own handle, so it stays valid after every
    /// other handle (including the one in a pending table) is dropped. If the
    /// deferred is never settled the future never completes.
    pub fn future(&self) -> impl std::future::Future<Output = Result<T, BridgeError>> + Send + 'static
    where
        T: Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        async move {
            loop {
                let notified = shared.notify.notified();
                tokio::pin!(notified);
                // Register before checking so a settle between the check and
                // the await is not missed.
                notified.as_mut().enable();

                let outcome = match &*shared.settlement.lock() {
                    Settlement::Pending => None,
                    Settlement::Fulfilled(value) => Some(Ok(value.clone())),
                    Settlement::Rejected(err) => Some(Err(err.clone())),
                };
                if let Some(outcome) = outcome {
                    return outcome;
                }

                notified.await;
            }
        }
    }
}
