//! Runtime helpers: idle-callback scheduling and debouncing.

pub mod debounce;
pub mod idle;

pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use idle::{IdleScheduler, IdleTask, ThreadIdleScheduler, TokioIdleScheduler};
