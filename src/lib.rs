//! # Worker Bridge
//!
//! A small RPC bridge between a caller and an isolated worker thread.
//!
//! A [`WorkerBridge`](core::WorkerBridge) owns one dedicated OS thread running
//! its own single-threaded tokio runtime. Each call is serialized to plain
//! data, tagged with a correlation id and sent to the worker; the worker runs
//! a named callback and posts back `(id, success, payload)`. A listener
//! matches the id against the table of pending requests and settles the
//! caller's [`Deferred`](core::Deferred).
//!
//! ## Key Features
//!
//! - **Correlated responses**: completions may arrive in any order
//! - **Sync bypass**: `CallOptions::sync()` runs the callback in-process
//! - **Named callbacks**: factories are registered by name and resolved inside the worker
//! - **Transfer lists**: byte buffers are moved to the worker, not copied
//! - **Explicit teardown**: pending requests are abandoned or rejected per policy
//!
//! ## Example
//!
//! ```rust,ignore
//! use worker_bridge::config::BridgeConfig;
//! use worker_bridge::core::{from_fn, register_callback, CallOptions, CallbackError, WorkerBridge};
//!
//! register_callback("double", || {
//!     Ok(from_fn(|n: i64| async move { Ok::<_, CallbackError>(n * 2) }))
//! });
//!
//! let bridge: WorkerBridge<i64, i64> = WorkerBridge::new(BridgeConfig::new("double"))?;
//!
//! // Worker round trip
//! let handle = bridge.call(21, CallOptions::default())?;
//! assert_eq!(handle.await?, 42);
//!
//! // Same callback, in-process
//! assert_eq!(bridge.call(21, CallOptions::sync())?.await?, 42);
//!
//! bridge.destroy();
//! ```
//!
//! For complete examples, see `tests/bridge_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Bridge, settlement primitive, protocol and callback registry.
pub mod core;
/// Configuration models for bridges.
pub mod config;
/// Builders to construct bridges from configuration.
pub mod builders;
/// Idle-callback scheduling and debouncing.
pub mod runtime;
/// Shared utilities.
pub mod util;
