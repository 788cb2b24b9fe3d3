//! Builders to construct bridges from configuration.

pub mod bridge_builder;

pub use bridge_builder::BridgeBuilder;
