//! Tests for runtime helpers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use worker_bridge::runtime::{Debouncer, IdleScheduler, ThreadIdleScheduler, TokioIdleScheduler};

#[tokio::test]
async fn test_tokio_idle_scheduler() {
    let scheduler = TokioIdleScheduler::new(tokio::runtime::Handle::current());
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let counter = Arc::clone(&counter);
        scheduler.schedule(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }
    // Nothing has run before the current task yields.
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[test]
fn test_thread_idle_scheduler() {
    let (tx, rx) = std::sync::mpsc::channel();
    let scheduler = ThreadIdleScheduler::new("idle-unit").unwrap();
    scheduler.defer(move || {
        tx.send(std::thread::current().name().map(str::to_string)).unwrap();
    });
    let name = rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(name.as_deref(), Some("idle-unit"));
}

#[tokio::test(start_paused = true)]
async fn test_debouncer_separate_bursts() {
    let calls = Arc::new(AtomicUsize::new(0));
    let debouncer = {
        let calls = Arc::clone(&calls);
        Debouncer::new(tokio::runtime::Handle::current(), Duration::from_millis(50), move |_: ()| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    };

    debouncer.trigger(());
    debouncer.trigger(());
    tokio::time::sleep(Duration::from_millis(100)).await;
    debouncer.trigger(());
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
