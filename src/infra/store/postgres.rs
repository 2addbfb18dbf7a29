//! Postgres-backed store adapter (schema and interface stubs).
//!
//! Carries the production schema, including the indexes required for the
//! open-task listing and deadline scans; actual DB I/O is left to an
//! integration layer with a database client.

use async_trait::async_trait;

use crate::core::store::{Reminder, ReminderStatus, ReminderStore, StatusMutator, TaskStore};
use crate::core::task::{Task, TaskDraft, TaskStatus};
use crate::core::DispatchError;
use crate::util::serde::{ReminderId, TaskId};

/// Postgres store adapter placeholder.
pub struct PostgresStore;

impl PostgresStore {
    /// Create a new adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Migration statements for the task and reminder tables.
    #[must_use]
    pub fn migrations() -> &'static [&'static str] {
        &[
            r#"
CREATE TABLE IF NOT EXISTS hall_tasks (
    id UUID PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    reward BIGINT NOT NULL CHECK (reward >= 0),
    status TEXT NOT NULL,
    priority INT NOT NULL DEFAULT 0,
    created_by UUID,
    claimed_by UUID,
    assigned_to UUID,
    auto_assign BOOLEAN NOT NULL DEFAULT FALSE,
    required_platform TEXT,
    required_rank TEXT,
    reminder_count INT NOT NULL DEFAULT 0,
    payout BIGINT,
    expires_at TIMESTAMPTZ,
    claimed_at TIMESTAMPTZ,
    completed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_hall_tasks_open
    ON hall_tasks (status, priority DESC, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_hall_tasks_expiry ON hall_tasks (expires_at);
"#,
            r#"
CREATE TABLE IF NOT EXISTS hall_reminders (
    id UUID PRIMARY KEY,
    task_id UUID NOT NULL REFERENCES hall_tasks (id),
    worker_id UUID NOT NULL,
    status TEXT NOT NULL,
    deadline TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_hall_reminders_task ON hall_reminders (task_id, created_at);
CREATE INDEX IF NOT EXISTS idx_hall_reminders_deadline ON hall_reminders (status, deadline);
"#,
        ]
    }

    fn not_wired<T>() -> Result<T, DispatchError> {
        Err(DispatchError::Unavailable(
            "postgres store not wired to database client".into(),
        ))
    }
}

impl Default for PostgresStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for PostgresStore {
    async fn create(&self, _draft: TaskDraft) -> Result<Task, DispatchError> {
        Self::not_wired()
    }

    async fn get(&self, _id: TaskId) -> Result<Task, DispatchError> {
        Self::not_wired()
    }

    async fn list_open(&self, _now_ms: u128) -> Result<Vec<Task>, DispatchError> {
        Self::not_wired()
    }

    async fn compare_and_transition(
        &self,
        _id: TaskId,
        _expected: TaskStatus,
        _next: TaskStatus,
        _mutate: StatusMutator,
    ) -> Result<Task, DispatchError> {
        Self::not_wired()
    }
}

#[async_trait]
impl ReminderStore for PostgresStore {
    async fn record(&self, _reminder: Reminder) -> Result<(), DispatchError> {
        Self::not_wired()
    }

    async fn get(&self, _id: ReminderId) -> Result<Reminder, DispatchError> {
        Self::not_wired()
    }

    async fn for_task(&self, _task_id: TaskId) -> Result<Vec<Reminder>, DispatchError> {
        Self::not_wired()
    }

    async fn open_offer(&self, _task_id: TaskId) -> Result<Option<Reminder>, DispatchError> {
        Self::not_wired()
    }

    async fn update_status(
        &self,
        _id: ReminderId,
        _expected: ReminderStatus,
        _next: ReminderStatus,
    ) -> Result<Reminder, DispatchError> {
        Self::not_wired()
    }
}
