//! Storage contracts: the task CAS primitive and the reminder ledger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::task::{Task, TaskDraft, TaskStatus};
use crate::core::DispatchError;
use crate::util::serde::{ReminderId, TaskId, WorkerId};

/// Field mutation applied together with a status transition.
///
/// The mutator runs only after the store has re-validated the status
/// precondition, inside the same atomic step.
pub type StatusMutator = Box<dyn FnOnce(&mut Task) + Send>;

/// Durable record of tasks; status is the primary mutation surface.
///
/// `compare_and_transition` is the single mutation primitive every
/// higher-level operation is built on: operations against the same task are
/// serialized by its precondition check, so no task-level lock object exists
/// anywhere in the engine.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new task with status [`TaskStatus::Open`].
    ///
    /// # Errors
    ///
    /// [`DispatchError::Validation`] if the draft is malformed.
    async fn create(&self, draft: TaskDraft) -> Result<Task, DispatchError>;

    /// Fetch a task by id.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] for unknown ids.
    async fn get(&self, id: TaskId) -> Result<Task, DispatchError>;

    /// Snapshot of open, non-expired tasks ordered by priority descending,
    /// then creation time descending.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Unavailable`] on backend failure.
    async fn list_open(&self, now_ms: u128) -> Result<Vec<Task>, DispatchError>;

    /// Atomically apply `mutate` and move the task from `expected` to `next`,
    /// only if the stored status equals `expected` and the edge is legal.
    /// `expected == next` is permitted for field-only updates.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Conflict`] when the precondition does not hold,
    /// [`DispatchError::NotFound`] for unknown ids.
    async fn compare_and_transition(
        &self,
        id: TaskId,
        expected: TaskStatus,
        next: TaskStatus,
        mutate: StatusMutator,
    ) -> Result<Task, DispatchError>;
}

/// Delivery state of a dispatch reminder (assignment offer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    /// Recorded but not yet announced to the worker.
    Pending,
    /// Announced; awaiting acknowledgment before the deadline.
    Sent,
    /// The worker accepted the offer in time.
    Acknowledged,
    /// The deadline passed without acknowledgment.
    Expired,
}

/// A dispatch offer binding one candidate worker to one task, with an
/// acknowledgment deadline enforced by scheduler ticks rather than timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    /// Unique identifier.
    pub id: ReminderId,
    /// Task on offer.
    pub task_id: TaskId,
    /// Candidate the offer targets.
    pub worker_id: WorkerId,
    /// Acknowledgment deadline (ms since epoch).
    pub deadline_ms: u128,
    /// Delivery state.
    pub status: ReminderStatus,
    /// When the offer was recorded (ms since epoch).
    pub created_at_ms: u128,
}

impl Reminder {
    /// Whether this offer is still awaiting acknowledgment.
    #[must_use]
    pub fn is_live(&self, now_ms: u128) -> bool {
        matches!(self.status, ReminderStatus::Pending | ReminderStatus::Sent)
            && now_ms <= self.deadline_ms
    }
}

/// Durable ledger of dispatch offers, mutated only by the scheduler and by
/// worker acknowledgments.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Insert a new reminder record.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Unavailable`] on backend failure.
    async fn record(&self, reminder: Reminder) -> Result<(), DispatchError>;

    /// Fetch a reminder by id.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] for unknown ids.
    async fn get(&self, id: ReminderId) -> Result<Reminder, DispatchError>;

    /// All reminders recorded for a task, oldest first.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Unavailable`] on backend failure.
    async fn for_task(&self, task_id: TaskId) -> Result<Vec<Reminder>, DispatchError>;

    /// The unresolved offer for a task, if any: pending or sent, regardless
    /// of deadline. The caller decides whether an overdue offer escalates.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Unavailable`] on backend failure.
    async fn open_offer(&self, task_id: TaskId) -> Result<Option<Reminder>, DispatchError>;

    /// Atomically move a reminder from `expected` to `next`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Conflict`] when the stored status differs from
    /// `expected`, [`DispatchError::NotFound`] for unknown ids.
    async fn update_status(
        &self,
        id: ReminderId,
        expected: ReminderStatus,
        next: ReminderStatus,
    ) -> Result<Reminder, DispatchError>;
}
