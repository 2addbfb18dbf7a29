//! Tests for error types

use hall_dispatch::core::DispatchError;

#[test]
fn test_validation_error() {
    let err = DispatchError::Validation("title must not be empty".to_string());
    assert_eq!(format!("{err}"), "validation failed: title must not be empty");
}

#[test]
fn test_conflict_error() {
    let err = DispatchError::Conflict("status changed".to_string());
    assert_eq!(format!("{err}"), "conflict: status changed");
}

#[test]
fn test_forbidden_error() {
    let err = DispatchError::Forbidden("not the claimant".to_string());
    assert_eq!(format!("{err}"), "forbidden: not the claimant");
}

#[test]
fn test_not_found_error() {
    let err = DispatchError::NotFound("task missing".to_string());
    assert_eq!(format!("{err}"), "not found: task missing");
}

#[test]
fn test_unavailable_error() {
    let err = DispatchError::Unavailable("connection refused".to_string());
    assert_eq!(format!("{err}"), "backend unavailable: connection refused");
}

#[test]
fn test_only_unavailable_is_retryable() {
    assert!(DispatchError::Unavailable("timeout".into()).is_retryable());
    assert!(!DispatchError::Conflict("stale".into()).is_retryable());
    assert!(!DispatchError::Forbidden("no".into()).is_retryable());
    assert!(!DispatchError::NotFound("gone".into()).is_retryable());
    assert!(!DispatchError::Validation("bad".into()).is_retryable());
}
