//! Tests for configuration validation

use hall_dispatch::config::{DispatchSettings, EngineConfig};

#[test]
fn test_default_config_is_valid() {
    assert!(EngineConfig::default().validate().is_ok());
}

#[test]
fn test_dispatch_settings_defaults() {
    let d = DispatchSettings::default();
    assert_eq!(d.tick_interval_secs, 30);
    assert_eq!(d.ack_window_secs, 300);
    assert_eq!(d.max_escalations, 3);
}

#[test]
fn test_invalid_tick_interval() {
    let mut cfg = EngineConfig::default();
    cfg.dispatch.tick_interval_secs = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_ack_window() {
    let mut cfg = EngineConfig::default();
    cfg.dispatch.ack_window_secs = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_max_escalations() {
    let mut cfg = EngineConfig::default();
    cfg.dispatch.max_escalations = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_retry_backoff() {
    let mut cfg = EngineConfig::default();
    cfg.claim.retry_backoff_ms = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_str_roundtrip() {
    let json = r#"{
        "claim": { "complete_from_claimed": false, "max_store_retries": 5, "retry_backoff_ms": 20 },
        "dispatch": { "tick_interval_secs": 10, "ack_window_secs": 60, "max_escalations": 2 },
        "store": "in_memory",
        "bus": "in_memory"
    }"#;
    let cfg = EngineConfig::from_json_str(json).unwrap();
    assert!(!cfg.claim.complete_from_claimed);
    assert_eq!(cfg.claim.max_store_retries, 5);
    assert_eq!(cfg.dispatch.tick_interval_secs, 10);
    assert_eq!(cfg.dispatch.max_escalations, 2);
}

#[test]
fn test_from_json_str_rejects_invalid_values() {
    let json = r#"{
        "claim": { "complete_from_claimed": true, "max_store_retries": 3, "retry_backoff_ms": 50 },
        "dispatch": { "tick_interval_secs": 0, "ack_window_secs": 60, "max_escalations": 2 },
        "store": "in_memory",
        "bus": "in_memory"
    }"#;
    assert!(EngineConfig::from_json_str(json).is_err());
}

#[test]
fn test_from_json_str_rejects_malformed_input() {
    assert!(EngineConfig::from_json_str("not json").is_err());
}
