//! Tests for audit sinks

use hall_dispatch::core::{build_audit_event, AuditSink, InMemoryAuditSink, PostgresAuditSink};

#[test]
fn test_build_audit_event() {
    let event = build_audit_event(
        "ev-1",
        "task-1",
        Some("worker-1".to_string()),
        "claim",
        None,
    );
    assert_eq!(event.event_id, "ev-1");
    assert_eq!(event.task_id, "task-1");
    assert_eq!(event.actor.as_deref(), Some("worker-1"));
    assert_eq!(event.action, "claim");
    assert!(event.created_at_ms > 0);
    assert!(event.detail.is_none());
}

#[test]
fn test_in_memory_sink_records_events() {
    let mut sink = InMemoryAuditSink::new(10);
    sink.record(build_audit_event("ev-1", "task-1", None, "offer", None));
    sink.record(build_audit_event("ev-2", "task-1", None, "escalate", None));
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action, "offer");
    assert_eq!(events[1].action, "escalate");
}

#[test]
fn test_in_memory_sink_drops_oldest_at_capacity() {
    let mut sink = InMemoryAuditSink::new(2);
    for i in 0..4 {
        sink.record(build_audit_event(format!("ev-{i}"), "task-1", None, "claim", None));
    }
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_id, "ev-2");
    assert_eq!(events[1].event_id, "ev-3");
}

#[test]
fn test_postgres_sink_migrations_define_schema() {
    let migrations = PostgresAuditSink::migrations();
    assert!(!migrations.is_empty());
    assert!(migrations[0].contains("hall_audit_events"));
    assert!(migrations[0].contains("idx_hall_audit_events_task"));
}
