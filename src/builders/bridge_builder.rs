//! Fluent construction of a [`WorkerBridge`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{BridgeConfig, TeardownPolicy};
use crate::core::{BridgeError, CallbackError, CallbackRegistry, WorkerBridge, WorkerCallback};

/// Builder for a [`WorkerBridge`].
///
/// Without an explicit registry the global one is used.
///
/// ```rust,ignore
/// let bridge: WorkerBridge<i64, i64> = BridgeBuilder::new("double")
///     .factory(|| Ok(from_fn(|n: i64| async move { Ok::<_, CallbackError>(n * 2) })))
///     .teardown(TeardownPolicy::Reject)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct BridgeBuilder {
    config: BridgeConfig,
    registry: Option<CallbackRegistry>,
}

impl BridgeBuilder {
    /// Start a builder for the callback registered as `callback`.
    pub fn new(callback: impl Into<String>) -> Self {
        Self::from_config(BridgeConfig::new(callback))
    }

    /// Start from an existing configuration.
    pub const fn from_config(config: BridgeConfig) -> Self {
        Self {
            config,
            registry: None,
        }
    }

    /// Resolve the callback from `registry` instead of the global one.
    #[must_use]
    pub fn registry(mut self, registry: CallbackRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Register `factory` under the configured callback name.
    ///
    /// Goes into the builder's registry, creating a private one if none was
    /// set, so the global registry is left alone.
    #[must_use]
    pub fn factory<C, F>(mut self, factory: F) -> Self
    where
        C: WorkerCallback,
        F: Fn() -> Result<C, CallbackError> + Send + Sync + 'static,
    {
        let registry = self.registry.get_or_insert_with(CallbackRegistry::new);
        registry.register(self.config.callback.clone(), factory);
        self
    }

    /// Set the worker thread name.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_thread_name(name);
        self
    }

    /// Set the worker stack size in bytes.
    #[must_use]
    pub fn thread_stack_size(mut self, bytes: usize) -> Self {
        self.config = self.config.with_thread_stack_size(bytes);
        self
    }

    /// Set the teardown policy.
    #[must_use]
    pub fn teardown(mut self, policy: TeardownPolicy) -> Self {
        self.config = self.config.with_teardown(policy);
        self
    }

    /// Configuration as built so far.
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Spawn the bridge.
    ///
    /// # Errors
    ///
    /// Same as [`WorkerBridge::with_registry`].
    pub fn build<I, O>(self) -> Result<WorkerBridge<I, O>, BridgeError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let registry = self
            .registry
            .unwrap_or_else(|| CallbackRegistry::global().clone());
        WorkerBridge::with_registry(self.config, registry)
    }
}
