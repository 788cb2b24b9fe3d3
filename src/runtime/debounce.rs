//! Trailing-edge debouncing on a tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Quiet period used by [`Debouncer::with_default_delay`].
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Collapses a burst of triggers into one callback run.
///
/// Each [`trigger`](Debouncer::trigger) restarts the timer; the callback runs
/// once the debouncer has been quiet for `delay`, with the argument of the
/// last trigger.
pub struct Debouncer<A> {
    delay: Duration,
    handle: tokio::runtime::Handle,
    callback: Arc<dyn Fn(A) + Send + Sync>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<A: Send + 'static> Debouncer<A> {
    /// Create a debouncer that spawns its timers on `handle`.
    pub fn new<F>(handle: tokio::runtime::Handle, delay: Duration, callback: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            delay,
            handle,
            callback: Arc::new(callback),
            timer: Mutex::new(None),
        }
    }

    /// Debouncer on the current runtime with [`DEFAULT_DEBOUNCE`].
    ///
    /// Returns `None` outside a tokio runtime.
    pub fn with_default_delay<F>(callback: F) -> Option<Self>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        Some(Self::new(handle, DEFAULT_DEBOUNCE, callback))
    }

    /// Restart the quiet period; `arg` replaces any earlier pending argument.
    pub fn trigger(&self, arg: A) {
        let callback = Arc::clone(&self.callback);
        let delay = self.delay;
        let mut timer = self.timer.lock();
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        *timer = Some(self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            callback(arg);
        }));
    }

    /// Drop any pending run.
    pub fn cancel(&self) {
        if let Some(previous) = self.timer.lock().take() {
            previous.abort();
        }
    }

    /// Whether a run is scheduled and has not happened yet.
    pub fn is_pending(&self) -> bool {
        self.timer.lock().as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl<A> Drop for Debouncer<A> {
    fn drop(&mut self) {
        if let Some(previous) = self.timer.lock().take() {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_once_with_last_arg() {
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(0u32));

        let debouncer = {
            let calls = Arc::clone(&calls);
            let last = Arc::clone(&last);
            Debouncer::new(tokio::runtime::Handle::current(), Duration::from_millis(100), move |n| {
                calls.fetch_add(1, Ordering::SeqCst);
                *last.lock() = n;
            })
        };

        for n in 1..=3 {
            debouncer.trigger(n);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*last.lock(), 3);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let calls = Arc::new(AtomicUsize::new(0));
        let debouncer = {
            let calls = Arc::clone(&calls);
            Debouncer::with_default_delay(move |()| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
        };

        debouncer.trigger(());
        assert!(debouncer.is_pending());
        debouncer.cancel();
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
