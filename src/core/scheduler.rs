//! Auto-dispatch: proactively offer `auto_assign` tasks to ranked workers
//! and escalate through candidates until one accepts or the pool runs out.
//!
//! All scheduler state lives in task and reminder records; crash recovery is
//! a re-scan of the store, and acknowledgment deadlines are enforced by tick
//! timestamp comparisons rather than per-offer timers.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::audit::{build_audit_event, AuditSink};
use crate::core::event::{NotificationBus, TaskEvent};
use crate::core::store::{Reminder, ReminderStatus, ReminderStore, TaskStore};
use crate::core::task::{Task, TaskStatus};
use crate::core::worker::WorkerDirectory;
use crate::core::DispatchError;
use crate::util::clock::Clock;
use crate::util::serde::{ReminderId, TaskId, WorkerId};

/// Abstraction for spawning the scheduler loop on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Tuning values for the dispatch scheduler.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Interval between scheduler ticks.
    pub tick_interval: Duration,
    /// How long an offered worker has to acknowledge, in milliseconds.
    pub ack_window_ms: u64,
    /// Offers issued per task before auto-dispatch gives up and the task
    /// reverts to manual claiming.
    pub max_escalations: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(30),
            ack_window_ms: 300_000,
            max_escalations: 3,
        }
    }
}

/// Periodic scanner that drives the offer/acknowledge state machine for
/// auto-assign tasks.
pub struct DispatchScheduler {
    store: Arc<dyn TaskStore>,
    reminders: Arc<dyn ReminderStore>,
    directory: Arc<dyn WorkerDirectory>,
    bus: Arc<dyn NotificationBus>,
    clock: Arc<dyn Clock>,
    config: DispatchConfig,
    audit: Option<Arc<Mutex<Box<dyn AuditSink>>>>,
    /// Single-flight guard: overlapping ticks are suppressed, not queued.
    ticking: AtomicBool,
    stopped: AtomicBool,
}

impl DispatchScheduler {
    /// Create a scheduler from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn TaskStore>,
        reminders: Arc<dyn ReminderStore>,
        directory: Arc<dyn WorkerDirectory>,
        bus: Arc<dyn NotificationBus>,
        clock: Arc<dyn Clock>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            reminders,
            directory,
            bus,
            clock,
            config,
            audit: None,
            ticking: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Attach a shared audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<Mutex<Box<dyn AuditSink>>>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Run one scheduler pass and return the number of offers issued.
    ///
    /// Re-running on identical store state is a no-op: tasks with a live
    /// offer are skipped, and a concurrent tick is suppressed entirely.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Unavailable`] when the open-task scan itself fails;
    /// per-task conflicts are absorbed, never surfaced.
    pub async fn tick(&self) -> Result<usize, DispatchError> {
        if self.ticking.swap(true, Ordering::AcqRel) {
            tracing::debug!("tick already in flight, suppressing");
            return Ok(0);
        }
        let result = self.scan().await;
        self.ticking.store(false, Ordering::Release);
        result
    }

    /// Accept a live offer: the offered worker takes the assignment.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] when no unresolved offer exists,
    /// [`DispatchError::Forbidden`] when the offer targets someone else,
    /// [`DispatchError::Conflict`] when the deadline passed or a manual
    /// claim won the task meanwhile.
    pub async fn acknowledge(
        &self,
        task_id: TaskId,
        worker_id: WorkerId,
    ) -> Result<Task, DispatchError> {
        let now = self.clock.now_ms();
        let Some(offer) = self.reminders.open_offer(task_id).await? else {
            return Err(DispatchError::NotFound(format!(
                "no live offer for task {task_id}"
            )));
        };
        if offer.worker_id != worker_id {
            return Err(DispatchError::Forbidden(
                "the offer targets a different worker".into(),
            ));
        }
        if now > offer.deadline_ms {
            return Err(DispatchError::Conflict(
                "the offer deadline has passed".into(),
            ));
        }

        let assigned = match self
            .store
            .compare_and_transition(
                task_id,
                TaskStatus::Open,
                TaskStatus::Assigned,
                Box::new(move |t| {
                    t.assigned_to = Some(worker_id);
                    t.claimed_by = Some(worker_id);
                    t.claimed_at_ms = Some(now);
                }),
            )
            .await
        {
            Ok(task) => task,
            Err(DispatchError::Conflict(reason)) => {
                // A manual claim won while the offer was out; retire it.
                let _ = self
                    .reminders
                    .update_status(offer.id, offer.status, ReminderStatus::Expired)
                    .await;
                return Err(DispatchError::Conflict(reason));
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = self
            .reminders
            .update_status(offer.id, offer.status, ReminderStatus::Acknowledged)
            .await
        {
            tracing::warn!(%task_id, "failed to mark offer acknowledged: {e}");
        }

        tracing::info!(%task_id, %worker_id, "offer acknowledged, task assigned");
        self.record_audit(task_id, Some(worker_id), "ack", None);
        self.bus.publish(TaskEvent::TaskAssigned {
            task_id,
            worker_id,
            at_ms: now,
        });
        Ok(assigned)
    }

    /// Spawn the periodic tick loop onto a runtime.
    pub fn run<S: Spawn>(self: &Arc<Self>, spawner: &S) {
        let scheduler = Arc::clone(self);
        let interval = self.config.tick_interval;
        spawner.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if scheduler.stopped.load(Ordering::Acquire) {
                    tracing::info!("dispatch scheduler shutting down");
                    break;
                }
                if let Err(e) = scheduler.tick().await {
                    tracing::error!("scheduler tick failed: {e}");
                }
            }
        });
    }

    /// Stop the tick loop after its current pass.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    async fn scan(&self) -> Result<usize, DispatchError> {
        let now = self.clock.now_ms();
        let open = self.store.list_open(now).await?;
        let mut issued = 0usize;
        for task in open.into_iter().filter(|t| t.auto_assign) {
            match self.advance_offer(&task, now).await {
                Ok(true) => issued += 1,
                Ok(false) => {}
                // Scheduler-internal failures defer to the next tick.
                Err(e) => {
                    tracing::warn!(task_id = %task.id, "offer pass failed: {e}");
                }
            }
        }
        tracing::debug!(issued, "scheduler pass finished");
        Ok(issued)
    }

    /// Advance the offer state machine for one task. Returns whether a new
    /// offer was issued.
    async fn advance_offer(&self, task: &Task, now: u128) -> Result<bool, DispatchError> {
        if let Some(offer) = self.reminders.open_offer(task.id).await? {
            if now <= offer.deadline_ms {
                return Ok(false);
            }
            // Overdue: withdraw before escalating.
            match self
                .reminders
                .update_status(offer.id, offer.status, ReminderStatus::Expired)
                .await
            {
                Ok(_) => {
                    tracing::debug!(task_id = %task.id, worker = %offer.worker_id, "offer expired");
                    self.record_audit(
                        task.id,
                        Some(offer.worker_id),
                        "escalate",
                        Some("ack window elapsed".into()),
                    );
                }
                // Acknowledged concurrently; nothing to do.
                Err(DispatchError::Conflict(_)) => return Ok(false),
                Err(e) => return Err(e),
            }
        }

        if task.reminder_count >= self.config.max_escalations {
            self.exhaust(task, "escalation limit reached").await?;
            return Ok(false);
        }

        let requirement = task.requirement();
        let mut candidates = self.directory.available_for(&requirement).await?;
        let offered: HashSet<WorkerId> = self
            .reminders
            .for_task(task.id)
            .await?
            .iter()
            .map(|r| r.worker_id)
            .collect();
        candidates.retain(|w| !offered.contains(&w.id));
        if candidates.is_empty() {
            self.exhaust(task, "no eligible candidates").await?;
            return Ok(false);
        }
        // Highest reputation first; ties go to the most recently idle.
        candidates.sort_by(|a, b| {
            b.reputation
                .cmp(&a.reputation)
                .then(b.last_idle_at_ms.cmp(&a.last_idle_at_ms))
        });
        self.issue_offer(task, candidates[0].id, now).await
    }

    async fn issue_offer(
        &self,
        task: &Task,
        worker_id: WorkerId,
        now: u128,
    ) -> Result<bool, DispatchError> {
        // Bump the escalation counter first; losing this CAS means a manual
        // claim took the task while the offer was being prepared.
        let updated = match self
            .store
            .compare_and_transition(
                task.id,
                TaskStatus::Open,
                TaskStatus::Open,
                Box::new(|t| t.reminder_count += 1),
            )
            .await
        {
            Ok(t) => t,
            Err(DispatchError::Conflict(_)) => {
                tracing::debug!(task_id = %task.id, "task left open state, offer dropped");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let escalation = updated.reminder_count;
        let deadline_ms = now + u128::from(self.config.ack_window_ms);
        let reminder = Reminder {
            id: ReminderId::new(),
            task_id: task.id,
            worker_id,
            deadline_ms,
            status: ReminderStatus::Pending,
            created_at_ms: now,
        };
        let reminder_id = reminder.id;
        self.reminders.record(reminder).await?;

        self.bus.publish(TaskEvent::ReminderIssued {
            task_id: task.id,
            worker_id,
            escalation,
            deadline_ms,
            at_ms: now,
        });
        // Announced; a failure here self-heals on the next tick.
        if let Err(e) = self
            .reminders
            .update_status(reminder_id, ReminderStatus::Pending, ReminderStatus::Sent)
            .await
        {
            tracing::warn!(task_id = %task.id, "failed to mark offer sent: {e}");
        }

        tracing::info!(
            task_id = %task.id,
            %worker_id,
            escalation,
            "dispatch offer issued"
        );
        self.record_audit(
            task.id,
            Some(worker_id),
            "offer",
            Some(format!("escalation={escalation}")),
        );
        Ok(true)
    }

    /// Give up on auto-dispatch: the task reverts to plain manual claiming
    /// and staff are alerted through the audit log.
    async fn exhaust(&self, task: &Task, reason: &str) -> Result<(), DispatchError> {
        match self
            .store
            .compare_and_transition(
                task.id,
                TaskStatus::Open,
                TaskStatus::Open,
                Box::new(|t| t.auto_assign = false),
            )
            .await
        {
            Ok(_) => {
                tracing::warn!(
                    task_id = %task.id,
                    reason,
                    "auto-dispatch exhausted, task reverts to manual claiming"
                );
                self.record_audit(task.id, None, "dispatch_exhausted", Some(reason.to_string()));
                Ok(())
            }
            // Claimed meanwhile; the manual path resolved it for us.
            Err(DispatchError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
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
