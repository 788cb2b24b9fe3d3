//! Shared utilities.

pub mod id;
pub mod telemetry;

pub use id::{generate_id, IdGenerator, RandomIdGenerator, ID_ALPHABET, ID_LENGTH};
pub use telemetry::init_tracing;
