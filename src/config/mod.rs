//! Configuration models for bridges and their worker threads.

pub mod bridge;

pub use bridge::{BridgeConfig, TeardownPolicy};
