//! Tests for configuration validation

use worker_bridge::config::{BridgeConfig, TeardownPolicy};

#[test]
fn test_bridge_config_validation() {
    let valid = BridgeConfig::new("double");
    assert!(valid.validate().is_ok());
    assert_eq!(valid.teardown, TeardownPolicy::Abandon);
}

#[test]
fn test_bridge_config_invalid_callback() {
    let invalid = BridgeConfig::new("  ");
    assert!(invalid.validate().is_err());
}

#[test]
fn test_bridge_config_invalid_thread_name() {
    let invalid = BridgeConfig::new("double").with_thread_name("");
    assert!(invalid.validate().is_err());

    let invalid = BridgeConfig::new("double").with_thread_name("bad\0name");
    assert!(invalid.validate().is_err());
}

#[test]
fn test_bridge_config_invalid_stack_size() {
    let invalid = BridgeConfig::new("double").with_thread_stack_size(1024);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_bridge_config_from_json() {
    let json = r#"{
        "callback": "double",
        "thread_name": "doubler",
        "teardown": "reject"
    }"#;

    let config = BridgeConfig::from_json_str(json).unwrap();
    assert_eq!(config.callback, "double");
    assert_eq!(config.thread_name, "doubler");
    assert_eq!(config.teardown, TeardownPolicy::Reject);
    assert_eq!(config.thread_stack_size, BridgeConfig::new("x").thread_stack_size);
}

#[test]
fn test_bridge_config_from_json_invalid() {
    assert!(BridgeConfig::from_json_str("{}").is_err());
    assert!(BridgeConfig::from_json_str(r#"{"callback": ""}"#).is_err());
    assert!(BridgeConfig::from_json_str(r#"{"callback": "a", "teardown": "explode"}"#).is_err());
}

#[test]
fn test_teardown_policy_parse() {
    assert_eq!("abandon".parse::<TeardownPolicy>(), Ok(TeardownPolicy::Abandon));
    assert_eq!(" REJECT ".parse::<TeardownPolicy>(), Ok(TeardownPolicy::Reject));
    assert!("later".parse::<TeardownPolicy>().is_err());
}
