//! Worker callbacks and the named registry they are resolved from.
//!
//! Closures cannot cross a thread boundary as source text, so a bridge names
//! the callback it wants and both the worker thread and the in-process path
//! look the factory up in a [`CallbackRegistry`].

use std::collections::HashMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::{BridgeError, CallbackError};
use super::protocol::TransferList;

/// Unary callback run inside a worker (or in-process for sync calls).
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use worker_bridge::core::{CallbackError, TransferList, WorkerCallback};
///
/// struct Doubler;
///
/// #[async_trait]
/// impl WorkerCallback for Doubler {
///     type Input = i64;
///     type Output = i64;
///
///     async fn call(&self, n: i64, _transfer: TransferList) -> Result<i64, CallbackError> {
///         Ok(n * 2)
///     }
/// }
/// ```
#[async_trait]
pub trait WorkerCallback: Send + Sync + 'static {
    /// Argument type, decoded from the request payload.
    type Input: DeserializeOwned + Send + 'static;
    /// Result type, encoded into the response payload.
    type Output: Serialize + Send + 'static;

    /// Handle one request.
    ///
    /// # Errors
    ///
    /// Any `CallbackError` is reported to the caller as a rejection.
    async fn call(&self, input: Self::Input, transfer: TransferList) -> Result<Self::Output, CallbackError>;
}

/// Callback built from an async closure. Transferred buffers are ignored.
pub struct FnCallback<I, O> {
    f: Box<dyn Fn(I) -> BoxFuture<'static, Result<O, CallbackError>> + Send + Sync>,
}

/// Wrap an async closure as a [`WorkerCallback`].
pub fn from_fn<I, O, F, Fut>(f: F) -> FnCallback<I, O>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, CallbackError>> + Send + 'static,
{
    FnCallback {
        f: Box::new(move |input| f(input).boxed()),
    }
}

#[async_trait]
impl<I, O> WorkerCallback for FnCallback<I, O>
where
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
{
    type Input = I;
    type Output = O;

    async fn call(&self, input: I, _transfer: TransferList) -> Result<O, CallbackError> {
        (self.f)(input).await
    }
}

/// Type-erased callback operating on plain data.
#[async_trait]
pub(crate) trait ErasedCallback: Send + Sync {
    async fn invoke(
        &self,
        payload: serde_json::Value,
        transfer: TransferList,
    ) -> Result<serde_json::Value, CallbackError>;
}

struct Erased<C>(C);

#[async_trait]
impl<C: WorkerCallback> ErasedCallback for Erased<C> {
    async fn invoke(
        &self,
        payload: serde_json::Value,
        transfer: TransferList,
    ) -> Result<serde_json::Value, CallbackError> {
        let input: C::Input = serde_json::from_value(payload)
            .map_err(|e| CallbackError::new(format!("invalid input: {e}")))?;
        let output = self.0.call(input, transfer).await?;
        serde_json::to_value(output).map_err(|e| CallbackError::new(format!("invalid output: {e}")))
    }
}

type Factory = Arc<dyn Fn() -> Result<Arc<dyn ErasedCallback>, CallbackError> + Send + Sync>;

/// Named callback factories.
///
/// Clones share the same table. [`CallbackRegistry::global`] is the
/// process-wide instance used by [`WorkerBridge::new`](crate::core::WorkerBridge::new).
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    factories: Arc<RwLock<HashMap<String, Factory>>>,
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl CallbackRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<CallbackRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Register `factory` under `name`, replacing any previous entry.
    ///
    /// The factory runs once per worker at startup and once more, lazily, the
    /// first time a bridge serves a sync call.
    pub fn register<C, F>(&self, name: impl Into<String>, factory: F)
    where
        C: WorkerCallback,
        F: Fn() -> Result<C, CallbackError> + Send + Sync + 'static,
    {
        let name = name.into();
        let erased: Factory = Arc::new(move || {
            factory().map(|cb| Arc::new(Erased(cb)) as Arc<dyn ErasedCallback>)
        });
        if self.factories.write().insert(name.clone(), erased).is_some() {
            warn!(callback = %name, "Replacing registered callback");
        } else {
            debug!(callback = %name, "Callback registered");
        }
    }

    /// Whether a callback is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Run the factory registered under `name`.
    ///
    /// A panicking factory is reported as a construction failure.
    pub(crate) fn instantiate(&self, name: &str) -> Result<Arc<dyn ErasedCallback>, BridgeError> {
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| BridgeError::UnknownCallback(name.to_string()))?;

        match panic::catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(Ok(callback)) => Ok(callback),
            Ok(Err(err)) => Err(BridgeError::Construction(err.message)),
            Err(_) => Err(BridgeError::Construction(format!("factory for `{name}` panicked"))),
        }
    }
}

/// Register a callback in the global registry.
pub fn register_callback<C, F>(name: impl Into<String>, factory: F)
where
    C: WorkerCallback,
    F: Fn() -> Result<C, CallbackError> + Send + Sync + 'static,
{
    CallbackRegistry::global().register(name, factory);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_instantiate_and_invoke() {
        let registry = CallbackRegistry::new();
        registry.register("double", || Ok(from_fn(|n: i64| async move { Ok::<_, CallbackError>(n * 2) })));

        let cb = registry.instantiate("double").unwrap();
        let out = cb.invoke(json!(21), TransferList::new()).await.unwrap();
        assert_eq!(out, json!(42));
    }

    #[tokio::test]
    async fn test_invalid_input_is_callback_error() {
        let registry = CallbackRegistry::new();
        registry.register("double", || Ok(from_fn(|n: i64| async move { Ok::<_, CallbackError>(n * 2) })));

        let cb = registry.instantiate("double").unwrap();
        let err = cb.invoke(json!("not a number"), TransferList::new()).await.unwrap_err();
        assert!(err.message.starts_with("invalid input"));
    }

    #[test]
    fn test_unknown_name() {
        let registry = CallbackRegistry::new();
        assert!(matches!(
            registry.instantiate("missing"),
            Err(BridgeError::UnknownCallback(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_factory_failure_and_panic() {
        let registry = CallbackRegistry::new();
        registry.register::<FnCallback<i64, i64>, _>("fails", || Err(CallbackError::new("no model")));
        registry.register::<FnCallback<i64, i64>, _>("panics", || panic!("factory exploded"));

        assert_eq!(
            registry.instantiate("fails").err(),
            Some(BridgeError::Construction("no model".into()))
        );
        assert!(matches!(
            registry.instantiate("panics"),
            Err(BridgeError::Construction(_))
        ));
    }

    #[test]
    fn test_names_sorted() {
        let registry = CallbackRegistry::new();
        registry.register("b", || Ok(from_fn(|n: u8| async move { Ok::<_, CallbackError>(n) })));
        registry.register("a", || Ok(from_fn(|n: u8| async move { Ok::<_, CallbackError>(n) })));
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
        assert!(registry.contains("a"));
    }
}
