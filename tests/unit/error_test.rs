//! Tests for error types

use serde_json::json;
use worker_bridge::core::{BridgeError, CallbackError};

#[test]
fn test_callback_error() {
    let err = BridgeError::Callback(CallbackError::new("bad input"));
    assert_eq!(format!("{}", err), "callback failed: bad input");
}

#[test]
fn test_construction_error() {
    let err = BridgeError::Construction("no weights".to_string());
    assert_eq!(format!("{}", err), "callback construction failed: no weights");
}

#[test]
fn test_unknown_callback_error() {
    let err = BridgeError::UnknownCallback("resize".to_string());
    assert_eq!(format!("{}", err), "unknown callback: resize");
}

#[test]
fn test_destroyed_error() {
    assert_eq!(format!("{}", BridgeError::Destroyed), "bridge destroyed");
}

#[test]
fn test_serde_error_conversion() {
    let parse = serde_json::from_str::<u8>("\"x\"").unwrap_err();
    let err: BridgeError = parse.into();
    assert!(matches!(err, BridgeError::Serialization(_)));
}

#[test]
fn test_callback_error_payload_keeps_detail() {
    let err = CallbackError::new("limit").with_data(json!({ "max": 3 }));
    let payload = err.to_payload();
    assert_eq!(payload, json!({ "message": "limit", "data": { "max": 3 } }));
    assert_eq!(CallbackError::from_payload(payload), err);
}
