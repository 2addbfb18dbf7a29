//! Tests for store adapters

use hall_dispatch::core::{DispatchError, ReminderStore, TaskStore};
use hall_dispatch::infra::store::{InMemoryStore, PostgresStore};
use hall_dispatch::util::serde::{ReminderId, TaskId};

#[test]
fn test_postgres_migrations_define_schema() {
    let migrations = PostgresStore::migrations();
    assert!(!migrations.is_empty());
    let sql = migrations.join("\n");
    assert!(sql.contains("hall_tasks"));
    assert!(sql.contains("hall_reminders"));
    assert!(sql.contains("idx_hall_tasks_open"));
}

#[tokio::test]
async fn test_postgres_operations_fail_until_wired() {
    let store = PostgresStore::new();
    let err = TaskStore::get(&store, TaskId::new()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Unavailable(_)));
    let err = store.open_offer(TaskId::new()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Unavailable(_)));
}

#[tokio::test]
async fn test_in_memory_store_misses_are_not_found() {
    let store = InMemoryStore::new();
    let err = TaskStore::get(&store, TaskId::new()).await.unwrap_err();
    assert!(matches!(err, DispatchError::NotFound(_)));
    let err = ReminderStore::get(&store, ReminderId::new()).await.unwrap_err();
    assert!(matches!(err, DispatchError::NotFound(_)));
}
