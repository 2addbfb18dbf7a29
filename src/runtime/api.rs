//! API-facing request/response models and thin entry points.

use serde::{Deserialize, Serialize};

use crate::builders::DispatchEngine;
use crate::core::claim::{ClaimOutcome, ClaimRejection};
use crate::core::error::DispatchError;
use crate::core::task::{TaskDraft, TaskStatus};
use crate::util::serde::{TaskId, WorkerId};

/// Task creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Acting staff member.
    pub actor_id: WorkerId,
    /// The task to create.
    pub draft: TaskDraft,
}

/// Claim attempt payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// Task to claim.
    pub task_id: TaskId,
    /// Worker attempting the claim.
    pub worker_id: WorkerId,
}

/// Claim attempt result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ClaimResponse {
    /// The claim took the task.
    Claimed {
        /// The claimed task.
        task_id: TaskId,
    },
    /// The claim lost or the task is not claimable.
    Rejected {
        /// Why the claim did not take.
        reason: ClaimRejection,
    },
}

/// Task status snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    /// Task identifier.
    pub task_id: TaskId,
    /// Current status.
    pub status: TaskStatus,
    /// Current claimant, when any.
    pub claimed_by: Option<WorkerId>,
    /// Auto-dispatch offers issued so far.
    pub reminder_count: u32,
}

/// Health response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Create an open task.
///
/// # Errors
///
/// Propagates coordinator errors.
pub async fn create_task(
    engine: &DispatchEngine,
    req: CreateTaskRequest,
) -> Result<TaskId, DispatchError> {
    let task = engine.coordinator.create(req.draft, req.actor_id).await?;
    Ok(task.id)
}

/// Attempt a claim. A lost race is a rejected response, not an error.
///
/// # Errors
///
/// Propagates coordinator errors (ineligible worker, store failures).
pub async fn claim_task(
    engine: &DispatchEngine,
    req: ClaimRequest,
) -> Result<ClaimResponse, DispatchError> {
    match engine.coordinator.claim(req.task_id, req.worker_id).await? {
        ClaimOutcome::Claimed(task) => Ok(ClaimResponse::Claimed { task_id: task.id }),
        ClaimOutcome::Rejected(reason) => Ok(ClaimResponse::Rejected { reason }),
    }
}

/// Fetch a task status snapshot.
///
/// # Errors
///
/// [`DispatchError::NotFound`] for an unknown task.
pub async fn task_status(
    engine: &DispatchEngine,
    task_id: TaskId,
) -> Result<TaskStatusResponse, DispatchError> {
    let task = engine.store.get(task_id).await?;
    Ok(TaskStatusResponse {
        task_id: task.id,
        status: task.status,
        claimed_by: task.claimed_by,
        reminder_count: task.reminder_count,
    })
}

/// Return a health payload.
#[must_use]
pub const fn health() -> Health {
    Health { ok: true }
}
