//! Tests for bridge builders

use worker_bridge::builders::BridgeBuilder;
use worker_bridge::config::TeardownPolicy;
use worker_bridge::core::{from_fn, BridgeError, CallbackError, CallbackRegistry, WorkerBridge};

#[test]
fn test_builder_config() {
    let builder = BridgeBuilder::new("double")
        .thread_name("doubler")
        .thread_stack_size(512 * 1024)
        .teardown(TeardownPolicy::Reject);

    let config = builder.config();
    assert_eq!(config.callback, "double");
    assert_eq!(config.thread_name, "doubler");
    assert_eq!(config.thread_stack_size, 512 * 1024);
    assert_eq!(config.teardown, TeardownPolicy::Reject);
}

#[test]
fn test_builder_unknown_callback() {
    let result: Result<WorkerBridge<i64, i64>, _> = BridgeBuilder::new("nothing-here")
        .registry(CallbackRegistry::new())
        .build();
    assert!(matches!(result, Err(BridgeError::UnknownCallback(_))));
}

#[tokio::test]
async fn test_builder_with_shared_registry() {
    let registry = CallbackRegistry::new();
    registry.register("inc", || Ok(from_fn(|n: u32| async move { Ok::<_, CallbackError>(n + 1) })));

    let bridge: WorkerBridge<u32, u32> = BridgeBuilder::new("inc").registry(registry).build().unwrap();
    assert_eq!(bridge.invoke(41).await, Ok(42));
}
