//! Lifecycle events, subscription filters, and the notification bus contract.
//!
//! Event delivery is a convenience signal, not the system of record:
//! subscribers that disconnect are pruned and must reconcile by re-fetching
//! on reconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::util::serde::{TaskId, WorkerId};

/// A state-change event published by the engine.
///
/// Per-task delivery order is causal (a claim is published before the
/// matching completion); no total order is promised across tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskEvent {
    /// A worker won the claim race for a task.
    TaskClaimed {
        /// Task that was claimed.
        task_id: TaskId,
        /// Winning worker.
        worker_id: WorkerId,
        /// When the claim committed (ms since epoch).
        at_ms: u128,
    },
    /// A task was dispatched (manually or automatically) to a worker.
    TaskAssigned {
        /// Task that was assigned.
        task_id: TaskId,
        /// Assignee.
        worker_id: WorkerId,
        /// When the assignment committed (ms since epoch).
        at_ms: u128,
    },
    /// The claimant finished the task; payout recorded.
    TaskCompleted {
        /// Task that was completed.
        task_id: TaskId,
        /// Claimant who completed it.
        worker_id: WorkerId,
        /// Payable amount in minor currency units.
        amount: i64,
        /// When the completion committed (ms since epoch).
        at_ms: u128,
    },
    /// The task was withdrawn before completion.
    TaskCancelled {
        /// Task that was cancelled.
        task_id: TaskId,
        /// Actor who cancelled, when known.
        actor_id: Option<WorkerId>,
        /// When the cancellation committed (ms since epoch).
        at_ms: u128,
    },
    /// The scheduler offered a task to a candidate worker.
    ReminderIssued {
        /// Task on offer.
        task_id: TaskId,
        /// Candidate the offer targets.
        worker_id: WorkerId,
        /// Escalation ordinal; increases by exactly one per offer.
        escalation: u32,
        /// Acknowledgment deadline (ms since epoch).
        deadline_ms: u128,
        /// When the offer was issued (ms since epoch).
        at_ms: u128,
    },
}

impl TaskEvent {
    /// The task this event concerns.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        match self {
            Self::TaskClaimed { task_id, .. }
            | Self::TaskAssigned { task_id, .. }
            | Self::TaskCompleted { task_id, .. }
            | Self::TaskCancelled { task_id, .. }
            | Self::ReminderIssued { task_id, .. } => *task_id,
        }
    }

    /// The worker this event concerns, when there is one.
    #[must_use]
    pub const fn worker_id(&self) -> Option<WorkerId> {
        match self {
            Self::TaskClaimed { worker_id, .. }
            | Self::TaskAssigned { worker_id, .. }
            | Self::TaskCompleted { worker_id, .. }
            | Self::ReminderIssued { worker_id, .. } => Some(*worker_id),
            Self::TaskCancelled { actor_id, .. } => *actor_id,
        }
    }
}

/// Predicate selecting which events a subscription receives.
///
/// An unset field matches everything; set fields must all match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Restrict to events about this task.
    pub task: Option<TaskId>,
    /// Restrict to events about this worker.
    pub worker: Option<WorkerId>,
}

impl EventFilter {
    /// Filter matching every event.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            task: None,
            worker: None,
        }
    }

    /// Filter matching events about one task.
    #[must_use]
    pub const fn for_task(task: TaskId) -> Self {
        Self {
            task: Some(task),
            worker: None,
        }
    }

    /// Filter matching events about one worker.
    #[must_use]
    pub const fn for_worker(worker: WorkerId) -> Self {
        Self {
            task: None,
            worker: Some(worker),
        }
    }

    /// Whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &TaskEvent) -> bool {
        if self.task.is_some_and(|t| t != event.task_id()) {
            return false;
        }
        if self.worker.is_some_and(|w| event.worker_id() != Some(w)) {
            return false;
        }
        true
    }
}

/// A cancellable stream of events matching a filter.
///
/// Dropping the subscription (or calling [`Subscription::cancel`]) stops
/// delivery; the publisher prunes the dead channel on its next publish.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<TaskEvent>,
    cancelled: Arc<AtomicBool>,
}

impl Subscription {
    /// Assemble a subscription from its channel half and cancel flag.
    /// Intended for bus implementations.
    #[must_use]
    pub fn new(rx: mpsc::UnboundedReceiver<TaskEvent>, cancelled: Arc<AtomicBool>) -> Self {
        Self { rx, cancelled }
    }

    /// Receive the next matching event, or `None` once cancelled and the
    /// publisher side is gone.
    pub async fn recv(&mut self) -> Option<TaskEvent> {
        if self.cancelled.load(Ordering::Acquire) {
            return None;
        }
        self.rx.recv().await
    }

    /// Receive a buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<TaskEvent> {
        if self.cancelled.load(Ordering::Acquire) {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Stop delivery. Idempotent; buffered events are discarded.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Fan-out of state-change events to interested subscribers.
///
/// Publishing is fire-and-forget and never blocks the caller; delivery to a
/// disconnected subscriber is dropped, not retried.
pub trait NotificationBus: Send + Sync {
    /// Publish an event to all matching live subscriptions.
    fn publish(&self, event: TaskEvent);

    /// Open a subscription for events matching `filter`.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}
