//! Bridge configuration structures.

use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Environment variable naming the registered callback.
pub const ENV_CALLBACK: &str = "WORKER_BRIDGE_CALLBACK";
/// Environment variable overriding the worker thread name.
pub const ENV_THREAD_NAME: &str = "WORKER_BRIDGE_THREAD_NAME";
/// Environment variable overriding the worker stack size in bytes.
pub const ENV_STACK_SIZE: &str = "WORKER_BRIDGE_STACK_SIZE";
/// Environment variable selecting the teardown policy.
pub const ENV_TEARDOWN: &str = "WORKER_BRIDGE_TEARDOWN";

const DEFAULT_THREAD_NAME: &str = "bridge-worker";
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
const MIN_STACK_SIZE: usize = 64 * 1024;

/// What `destroy()` does with requests still waiting for a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownPolicy {
    /// Drop them unsettled; awaiting callers stay suspended.
    #[default]
    Abandon,
    /// Reject each with `BridgeError::Destroyed`.
    Reject,
}

impl FromStr for TeardownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abandon" => Ok(Self::Abandon),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown teardown policy `{other}`")),
        }
    }
}

/// Configuration for a single [`WorkerBridge`](crate::core::WorkerBridge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Name of the registered callback the worker runs.
    pub callback: String,
    /// Name given to the worker thread.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
    /// Worker thread stack size in bytes.
    #[serde(default = "default_stack_size")]
    pub thread_stack_size: usize,
    /// Handling of outstanding requests on teardown.
    #[serde(default)]
    pub teardown: TeardownPolicy,
}

fn default_thread_name() -> String {
    DEFAULT_THREAD_NAME.to_string()
}

const fn default_stack_size() -> usize {
    DEFAULT_STACK_SIZE
}

impl BridgeConfig {
    /// Configuration running `callback` with default thread settings.
    pub fn new(callback: impl Into<String>) -> Self {
        Self {
            callback: callback.into(),
            thread_name: default_thread_name(),
            thread_stack_size: DEFAULT_STACK_SIZE,
            teardown: TeardownPolicy::default(),
        }
    }

    /// Set the worker thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the worker stack size in bytes.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Set the teardown policy.
    #[must_use]
    pub const fn with_teardown(mut self, policy: TeardownPolicy) -> Self {
        self.teardown = policy;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.callback.trim().is_empty() {
            return Err("callback must not be empty".into());
        }
        if self.thread_name.is_empty() {
            return Err("thread_name must not be empty".into());
        }
        if self.thread_name.contains('\0') {
            return Err("thread_name must not contain NUL bytes".into());
        }
        if self.thread_stack_size < MIN_STACK_SIZE {
            return Err(format!("thread_stack_size must be at least {MIN_STACK_SIZE} bytes"));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the environment, reading a `.env` file first
    /// if one exists.
    ///
    /// # Errors
    ///
    /// Fails when the callback variable is missing or a value does not parse.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let callback = lookup(ENV_CALLBACK).with_context(|| format!("{ENV_CALLBACK} is not set"))?;
        let mut cfg = Self::new(callback);

        if let Some(name) = lookup(ENV_THREAD_NAME) {
            cfg.thread_name = name;
        }
        if let Some(size) = lookup(ENV_STACK_SIZE) {
            cfg.thread_stack_size = size
                .trim()
                .parse()
                .with_context(|| format!("{ENV_STACK_SIZE} must be a byte count, got `{size}`"))?;
        }
        if let Some(policy) = lookup(ENV_TEARDOWN) {
            cfg.teardown = policy.parse().map_err(anyhow::Error::msg)?;
        }

        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_full() {
        let cfg = BridgeConfig::from_lookup(lookup_from(&[
            (ENV_CALLBACK, "double"),
            (ENV_THREAD_NAME, "doubler"),
            (ENV_STACK_SIZE, "1048576"),
            (ENV_TEARDOWN, "Reject"),
        ]))
        .unwrap();

        assert_eq!(cfg.callback, "double");
        assert_eq!(cfg.thread_name, "doubler");
        assert_eq!(cfg.thread_stack_size, 1_048_576);
        assert_eq!(cfg.teardown, TeardownPolicy::Reject);
    }

    #[test]
    fn test_from_lookup_missing_callback() {
        let err = BridgeConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains(ENV_CALLBACK));
    }

    #[test]
    fn test_from_lookup_bad_values() {
        assert!(BridgeConfig::from_lookup(lookup_from(&[
            (ENV_CALLBACK, "double"),
            (ENV_STACK_SIZE, "lots"),
        ]))
        .is_err());
        assert!(BridgeConfig::from_lookup(lookup_from(&[
            (ENV_CALLBACK, "double"),
            (ENV_TEARDOWN, "explode"),
        ]))
        .is_err());
    }
}
