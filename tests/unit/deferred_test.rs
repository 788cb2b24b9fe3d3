//! Tests for the settlement primitive

use std::time::Duration;
use worker_bridge::core::{BridgeError, Deferred, DeferredState};

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let deferred = Deferred::new();
    assert!(deferred.resolve("first"));
    assert!(!deferred.resolve("second"));
    assert!(!deferred.reject(BridgeError::Destroyed));
    assert_eq!(deferred.future().await, Ok("first"));
}

#[tokio::test]
async fn test_reject_is_idempotent() {
    let deferred: Deferred<u8> = Deferred::new();
    assert!(deferred.reject(BridgeError::Internal("boom".into())));
    assert!(!deferred.resolve(1));
    assert_eq!(deferred.state(), DeferredState::Rejected);
    assert_eq!(
        deferred.future().await,
        Err(BridgeError::Internal("boom".into()))
    );
}

#[tokio::test]
async fn test_await_before_settle() {
    let deferred = Deferred::new();
    let waiter = tokio::spawn(deferred.future());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(deferred.state(), DeferredState::Pending);
    deferred.resolve(5u64);
    assert_eq!(waiter.await.unwrap(), Ok(5));
}
