//! Claim coordination: serialize concurrent claim attempts so exactly one
//! caller wins per task.
//!
//! The coordinator never reads-then-writes without the store re-validating
//! the precondition atomically, so two simultaneous claims on the same task
//! leave exactly one winner regardless of arrival order. Losing the race is
//! a normal outcome ([`ClaimOutcome::Rejected`]), not an error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::audit::{build_audit_event, AuditSink};
use crate::core::event::{NotificationBus, TaskEvent};
use crate::core::store::TaskStore;
use crate::core::task::{Task, TaskDraft, TaskStatus};
use crate::core::worker::{Permission, WorkerDirectory};
use crate::core::DispatchError;
use crate::util::clock::Clock;
use crate::util::serde::{TaskId, WorkerId};

/// Policy knobs for claim and completion handling.
#[derive(Debug, Clone)]
pub struct ClaimPolicy {
    /// Allow completion straight from `Claimed`, without an explicit
    /// assignment step. Matches the original claim-then-complete flow.
    pub complete_from_claimed: bool,
    /// Bounded transparent retries for transient store failures.
    pub max_store_retries: u32,
    /// Base backoff between retries; grows linearly per attempt.
    pub retry_backoff: Duration,
}

impl Default for ClaimPolicy {
    fn default() -> Self {
        Self {
            complete_from_claimed: true,
            max_store_retries: 3,
            retry_backoff: Duration::from_millis(50),
        }
    }
}

/// Why a claim attempt did not take the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimRejection {
    /// Another worker holds (or just won) the claim.
    AlreadyClaimed,
    /// The task's deadline has passed.
    TaskExpired,
    /// The task is completed or cancelled.
    TaskClosed,
}

/// Outcome of a claim attempt. Rejection is expected under contention and
/// must be distinguishable from success without being an `Err`.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// The caller won the race and now holds the task.
    Claimed(Task),
    /// The task was not claimable; the reason says why.
    Rejected(ClaimRejection),
}

/// Serializes claim/complete/cancel traffic through the store's CAS
/// primitive and publishes lifecycle events on success.
pub struct ClaimCoordinator {
    store: Arc<dyn TaskStore>,
    directory: Arc<dyn WorkerDirectory>,
    bus: Arc<dyn NotificationBus>,
    clock: Arc<dyn Clock>,
    policy: ClaimPolicy,
    audit: Option<Arc<Mutex<Box<dyn AuditSink>>>>,
}

impl ClaimCoordinator {
    /// Create a coordinator from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn TaskStore>,
        directory: Arc<dyn WorkerDirectory>,
        bus: Arc<dyn NotificationBus>,
        clock: Arc<dyn Clock>,
        policy: ClaimPolicy,
    ) -> Self {
        Self {
            store,
            directory,
            bus,
            clock,
            policy,
            audit: None,
        }
    }

    /// Attach a shared audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<Mutex<Box<dyn AuditSink>>>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Create a new open task on behalf of a staff actor.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Forbidden`] without the `CreateTasks` permission,
    /// [`DispatchError::Validation`] for a malformed draft.
    pub async fn create(
        &self,
        mut draft: TaskDraft,
        actor_id: WorkerId,
    ) -> Result<Task, DispatchError> {
        let actor = self.directory.get(actor_id).await?;
        if !actor.role.has_permission(Permission::CreateTasks) {
            return Err(DispatchError::Forbidden(
                "creating tasks requires staff permission".into(),
            ));
        }
        draft.created_by.get_or_insert(actor_id);
        let task = self
            .with_retry("create task", || self.store.create(draft.clone()))
            .await?;
        tracing::info!(task_id = %task.id, actor = %actor_id, "task created");
        self.record_audit(task.id, Some(actor_id), "create", None);
        Ok(task)
    }

    /// Attempt to take exclusive ownership of an open task.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Forbidden`] if the worker is suspended, lacks the
    /// `ClaimTasks` permission, or fails the task's platform requirement;
    /// [`DispatchError::NotFound`] / [`DispatchError::Unavailable`] from the
    /// store. Losing the race is an `Ok(Rejected(..))`, never an error.
    pub async fn claim(
        &self,
        task_id: TaskId,
        worker_id: WorkerId,
    ) -> Result<ClaimOutcome, DispatchError> {
        let worker = self.directory.get(worker_id).await?;
        if !worker.is_active() {
            return Err(DispatchError::Forbidden(format!(
                "worker {worker_id} is not active"
            )));
        }
        if !worker.role.has_permission(Permission::ClaimTasks) {
            return Err(DispatchError::Forbidden(format!(
                "worker {worker_id} may not claim tasks"
            )));
        }

        let task = self
            .with_retry("fetch task", || self.store.get(task_id))
            .await?;
        if !worker.meets(&task.requirement()) {
            return Err(DispatchError::Forbidden(
                "worker does not meet the task's platform requirement".into(),
            ));
        }

        let now = self.clock.now_ms();
        if task.status.is_terminal() {
            return Ok(ClaimOutcome::Rejected(ClaimRejection::TaskClosed));
        }
        if task.status != TaskStatus::Open {
            return Ok(ClaimOutcome::Rejected(ClaimRejection::AlreadyClaimed));
        }
        if task.is_expired(now) {
            return Ok(ClaimOutcome::Rejected(ClaimRejection::TaskExpired));
        }

        let result = self
            .with_retry("claim transition", || {
                self.store.compare_and_transition(
                    task_id,
                    TaskStatus::Open,
                    TaskStatus::Claimed,
                    Box::new(move |t| {
                        t.claimed_by = Some(worker_id);
                        t.claimed_at_ms = Some(now);
                    }),
                )
            })
            .await;

        match result {
            Ok(task) => {
                tracing::info!(%task_id, %worker_id, "claim won");
                self.record_audit(task_id, Some(worker_id), "claim", None);
                self.bus.publish(TaskEvent::TaskClaimed {
                    task_id,
                    worker_id,
                    at_ms: now,
                });
                Ok(ClaimOutcome::Claimed(task))
            }
            Err(DispatchError::Conflict(_)) => {
                // Someone else committed first; a normal outcome under contention.
                tracing::info!(%task_id, %worker_id, "claim lost the race");
                self.record_audit(task_id, Some(worker_id), "reject", Some("already_claimed".into()));
                Ok(ClaimOutcome::Rejected(ClaimRejection::AlreadyClaimed))
            }
            Err(e) => Err(e),
        }
    }

    /// Move a held task into `InProgress`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Forbidden`] if the caller does not hold the task,
    /// [`DispatchError::Conflict`] if the status does not permit starting.
    pub async fn start(&self, task_id: TaskId, worker_id: WorkerId) -> Result<Task, DispatchError> {
        let task = self
            .with_retry("fetch task", || self.store.get(task_id))
            .await?;
        if task.holder() != Some(worker_id) {
            return Err(DispatchError::Forbidden(
                "only the holder may start a task".into(),
            ));
        }
        if !matches!(task.status, TaskStatus::Claimed | TaskStatus::Assigned) {
            return Err(DispatchError::Conflict(format!(
                "task is not startable from {:?}",
                task.status
            )));
        }
        let expected = task.status;
        let updated = self
            .with_retry("start transition", || {
                self.store.compare_and_transition(
                    task_id,
                    expected,
                    TaskStatus::InProgress,
                    Box::new(|_| {}),
                )
            })
            .await?;
        self.record_audit(task_id, Some(worker_id), "start", None);
        Ok(updated)
    }

    /// Complete a held task, recording a payout equal to its reward.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Forbidden`] when called by a non-claimant,
    /// [`DispatchError::Conflict`] if the status is not eligible.
    pub async fn complete(
        &self,
        task_id: TaskId,
        worker_id: WorkerId,
    ) -> Result<Task, DispatchError> {
        let task = self
            .with_retry("fetch task", || self.store.get(task_id))
            .await?;
        if task.claimed_by != Some(worker_id) {
            return Err(DispatchError::Forbidden(
                "only the claimant may complete a task".into(),
            ));
        }
        let eligible = matches!(task.status, TaskStatus::Assigned | TaskStatus::InProgress)
            || (self.policy.complete_from_claimed && task.status == TaskStatus::Claimed);
        if !eligible {
            return Err(DispatchError::Conflict(format!(
                "task is not completable from {:?}",
                task.status
            )));
        }

        let now = self.clock.now_ms();
        let expected = task.status;
        let updated = self
            .with_retry("complete transition", || {
                self.store.compare_and_transition(
                    task_id,
                    expected,
                    TaskStatus::Completed,
                    Box::new(move |t| {
                        t.completed_at_ms = Some(now);
                        t.payout = Some(t.reward);
                    }),
                )
            })
            .await?;

        let amount = updated.payout.unwrap_or(updated.reward);
        tracing::info!(%task_id, %worker_id, amount, "task completed");
        self.record_audit(task_id, Some(worker_id), "complete", Some(format!("payout={amount}")));
        self.bus.publish(TaskEvent::TaskCompleted {
            task_id,
            worker_id,
            amount,
            at_ms: now,
        });
        Ok(updated)
    }

    /// Cancel a task from `Open`, `Claimed`, or `Assigned`.
    ///
    /// The claimant may cancel their own task; any other actor needs the
    /// `CancelTasks` permission.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Conflict`] from other statuses,
    /// [`DispatchError::Forbidden`] without authority.
    pub async fn cancel(&self, task_id: TaskId, actor_id: WorkerId) -> Result<Task, DispatchError> {
        let actor = self.directory.get(actor_id).await?;
        let task = self
            .with_retry("fetch task", || self.store.get(task_id))
            .await?;
        if !matches!(
            task.status,
            TaskStatus::Open | TaskStatus::Claimed | TaskStatus::Assigned
        ) {
            return Err(DispatchError::Conflict(format!(
                "task is not cancellable from {:?}",
                task.status
            )));
        }
        let owns = task.holder() == Some(actor_id);
        if !owns && !actor.role.has_permission(Permission::CancelTasks) {
            return Err(DispatchError::Forbidden(
                "cancelling another worker's task requires staff permission".into(),
            ));
        }

        let now = self.clock.now_ms();
        let expected = task.status;
        let updated = self
            .with_retry("cancel transition", || {
                self.store.compare_and_transition(
                    task_id,
                    expected,
                    TaskStatus::Cancelled,
                    Box::new(|t| {
                        // Cancelled tasks hold no claimant.
                        t.claimed_by = None;
                        t.assigned_to = None;
                    }),
                )
            })
            .await?;

        tracing::info!(%task_id, actor = %actor_id, "task cancelled");
        self.record_audit(task_id, Some(actor_id), "cancel", None);
        self.bus.publish(TaskEvent::TaskCancelled {
            task_id,
            actor_id: Some(actor_id),
            at_ms: now,
        });
        Ok(updated)
    }

    /// Manually dispatch a task to a worker on behalf of a staff actor.
    ///
    /// From `Claimed` this only promotes the existing claimant; handing the
    /// task to someone else requires cancelling the claim first, so the
    /// displaced worker always sees a cancellation event.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Forbidden`] without staff authority or if the target
    /// worker is ineligible, [`DispatchError::Conflict`] unless the task is
    /// `Open`, or `Claimed` by the target worker.
    pub async fn assign(
        &self,
        task_id: TaskId,
        worker_id: WorkerId,
        actor_id: WorkerId,
    ) -> Result<Task, DispatchError> {
        let actor = self.directory.get(actor_id).await?;
        if !actor.role.has_permission(Permission::CreateTasks) {
            return Err(DispatchError::Forbidden(
                "manual assignment requires staff permission".into(),
            ));
        }
        let worker = self.directory.get(worker_id).await?;
        if !worker.is_active() || !worker.role.has_permission(Permission::ClaimTasks) {
            return Err(DispatchError::Forbidden(format!(
                "worker {worker_id} is not eligible for assignment"
            )));
        }

        let task = self
            .with_retry("fetch task", || self.store.get(task_id))
            .await?;
        if !matches!(task.status, TaskStatus::Open | TaskStatus::Claimed) {
            return Err(DispatchError::Conflict(format!(
                "task is not assignable from {:?}",
                task.status
            )));
        }
        if task.status == TaskStatus::Claimed && task.claimed_by != Some(worker_id) {
            return Err(DispatchError::Conflict(
                "task is claimed by another worker; cancel the claim to reassign".into(),
            ));
        }
        if !worker.meets(&task.requirement()) {
            return Err(DispatchError::Forbidden(
                "worker does not meet the task's platform requirement".into(),
            ));
        }

        let now = self.clock.now_ms();
        let expected = task.status;
        let updated = self
            .with_retry("assign transition", || {
                self.store.compare_and_transition(
                    task_id,
                    expected,
                    TaskStatus::Assigned,
                    Box::new(move |t| {
                        t.assigned_to = Some(worker_id);
                        t.claimed_by = Some(worker_id);
                        t.claimed_at_ms.get_or_insert(now);
                    }),
                )
            })
            .await?;

        tracing::info!(%task_id, %worker_id, actor = %actor_id, "task assigned");
        self.record_audit(task_id, Some(actor_id), "assign", Some(format!("worker={worker_id}")));
        self.bus.publish(TaskEvent::TaskAssigned {
            task_id,
            worker_id,
            at_ms: now,
        });
        Ok(updated)
    }

    /// Retry transient store failures up to the policy bound. Conflicts are
    /// never retried here; CAS preconditions make the retries idempotent.
    async fn with_retry<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, DispatchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DispatchError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Err(e) if e.is_retryable() && attempt < self.policy.max_store_retries => {
                    attempt += 1;
                    tracing::warn!("{what} failed transiently (attempt {attempt}): {e}");
                    tokio::time::sleep(self.policy.retry_backoff * attempt).await;
                }
                other => return other,
            }
        }
    }

    fn record_audit(
        &self,
        task_id: TaskId,
        actor: Option<WorkerId>,
        action: &str,
        detail: Option<String>,
    ) {
        if let Some(audit_sink) = &self.audit {
            let mut sink = audit_sink.lock();
            sink.record(build_audit_event(
                format!("{task_id}-{action}-{}", self.clock.now_ms()),
                task_id.to_string(),
                actor.map(|a| a.to_string()),
                action,
                detail,
            ));
        }
    }
}
