//! Tests for engine assembly from configuration

use std::sync::Arc;

use hall_dispatch::builders::build_engine;
use hall_dispatch::config::{EngineConfig, StoreBackendConfig};
use hall_dispatch::core::{DispatchError, InMemoryAuditSink, InMemoryDirectory};
use hall_dispatch::util::clock::SystemClock;
use hall_dispatch::util::serde::TaskId;

#[test]
fn test_build_engine_with_defaults() {
    let engine = build_engine(
        &EngineConfig::default(),
        Arc::new(InMemoryDirectory::new()),
        Arc::new(SystemClock),
        None,
    );
    assert!(engine.is_ok());
}

#[test]
fn test_build_engine_accepts_an_audit_sink() {
    let engine = build_engine(
        &EngineConfig::default(),
        Arc::new(InMemoryDirectory::new()),
        Arc::new(SystemClock),
        Some(Box::new(InMemoryAuditSink::new(100))),
    );
    assert!(engine.is_ok());
}

#[test]
fn test_build_engine_rejects_invalid_config() {
    let mut cfg = EngineConfig::default();
    cfg.dispatch.max_escalations = 0;
    let engine = build_engine(
        &cfg,
        Arc::new(InMemoryDirectory::new()),
        Arc::new(SystemClock),
        None,
    );
    assert!(engine.is_err());
}

#[tokio::test]
async fn test_postgres_backend_is_unwired() {
    let mut cfg = EngineConfig::default();
    cfg.store = StoreBackendConfig::Postgres;
    let engine = build_engine(
        &cfg,
        Arc::new(InMemoryDirectory::new()),
        Arc::new(SystemClock),
        None,
    )
    .unwrap();

    let err = engine.store.get(TaskId::new()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Unavailable(_)));
}
