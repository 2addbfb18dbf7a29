//! In-memory task and reminder store.
//!
//! The CAS path takes a single write lock per mutation, so precondition
//! check, transition, and field mutation commit as one atomic step. Suitable
//! for development and tests; the schema in the postgres adapter is the
//! production target.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::store::{Reminder, ReminderStatus, ReminderStore, StatusMutator, TaskStore};
use crate::core::task::{Task, TaskDraft, TaskStatus};
use crate::core::DispatchError;
use crate::util::clock::{Clock, SystemClock};
use crate::util::serde::{ReminderId, TaskId};

/// In-memory store backing both the task table and the reminder ledger.
pub struct InMemoryStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
    reminders: RwLock<HashMap<ReminderId, Reminder>>,
    clock: std::sync::Arc<dyn Clock>,
}

impl InMemoryStore {
    /// Create an empty store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(std::sync::Arc::new(SystemClock))
    }

    /// Create an empty store with an injected clock (tests).
    #[must_use]
    pub fn with_clock(clock: std::sync::Arc<dyn Clock>) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            reminders: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of task records held (any status).
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.read().len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn create(&self, draft: TaskDraft) -> Result<Task, DispatchError> {
        draft.validate()?;
        let task = Task::from_draft(TaskId::new(), draft, self.clock.now_ms());
        self.tasks.write().insert(task.id, task.clone());
        Ok(task)
    }

    async fn get(&self, id: TaskId) -> Result<Task, DispatchError> {
        self.tasks
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| DispatchError::NotFound(format!("task {id}")))
    }

    async fn list_open(&self, now_ms: u128) -> Result<Vec<Task>, DispatchError> {
        let mut open: Vec<Task> = self
            .tasks
            .read()
            .values()
            .filter(|t| t.status == TaskStatus::Open && !t.is_expired(now_ms))
            .cloned()
            .collect();
        open.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(b.created_at_ms.cmp(&a.created_at_ms))
        });
        Ok(open)
    }

    async fn compare_and_transition(
        &self,
        id: TaskId,
        expected: TaskStatus,
        next: TaskStatus,
        mutate: StatusMutator,
    ) -> Result<Task, DispatchError> {
        let mut tasks = self.tasks.write();
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| DispatchError::NotFound(format!("task {id}")))?;
        if task.status != expected {
            return Err(DispatchError::Conflict(format!(
                "task {id} is {:?}, expected {expected:?}",
                task.status
            )));
        }
        if expected != next && !expected.can_transition(next) {
            return Err(DispatchError::Conflict(format!(
                "illegal transition {expected:?} -> {next:?} for task {id}"
            )));
        }
        task.status = next;
        mutate(task);
        task.updated_at_ms = self.clock.now_ms();
        Ok(task.clone())
    }
}

#[async_trait]
impl ReminderStore for InMemoryStore {
    async fn record(&self, reminder: Reminder) -> Result<(), DispatchError> {
        self.reminders.write().insert(reminder.id, reminder);
        Ok(())
    }

    async fn get(&self, id: ReminderId) -> Result<Reminder, DispatchError> {
        self.reminders
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| DispatchError::NotFound(format!("reminder {id}")))
    }

    async fn for_task(&self, task_id: TaskId) -> Result<Vec<Reminder>, DispatchError> {
        let mut found: Vec<Reminder> = self
            .reminders
            .read()
            .values()
            .filter(|r| r.task_id == task_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.created_at_ms);
        Ok(found)
    }

    async fn open_offer(&self, task_id: TaskId) -> Result<Option<Reminder>, DispatchError> {
        Ok(self
            .reminders
            .read()
            .values()
            .find(|r| {
                r.task_id == task_id
                    && matches!(r.status, ReminderStatus::Pending | ReminderStatus::Sent)
            })
            .cloned())
    }

    async fn update_status(
        &self,
        id: ReminderId,
        expected: ReminderStatus,
        next: ReminderStatus,
    ) -> Result<Reminder, DispatchError> {
        let mut reminders = self.reminders.write();
        let reminder = reminders
            .get_mut(&id)
            .ok_or_else(|| DispatchError::NotFound(format!("reminder {id}")))?;
        if reminder.status != expected {
            return Err(DispatchError::Conflict(format!(
                "reminder {id} is {:?}, expected {expected:?}",
                reminder.status
            )));
        }
        reminder.status = next;
        Ok(reminder.clone())
    }
}
