//! Task records, lifecycle states, and the legal transition graph.

use serde::{Deserialize, Serialize};

use crate::core::DispatchError;
use crate::util::serde::{TaskId, WorkerId};

/// Lifecycle state of a task.
///
/// Transitions are monotonic: once a task reaches `Completed` or `Cancelled`
/// no operation can move it to any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Available for claiming.
    Open,
    /// A worker holds an exclusive claim.
    Claimed,
    /// Dispatched (manually or automatically) to a worker.
    Assigned,
    /// The worker has started the work.
    InProgress,
    /// Finished; payout recorded.
    Completed,
    /// Withdrawn before completion.
    Cancelled,
}

impl TaskStatus {
    /// Whether this state admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    #[must_use]
    pub const fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Claimed | Self::Assigned | Self::Cancelled)
                | (
                    Self::Claimed,
                    Self::Assigned | Self::InProgress | Self::Completed | Self::Cancelled
                )
                | (
                    Self::Assigned,
                    Self::InProgress | Self::Completed | Self::Cancelled
                )
                | (Self::InProgress, Self::Completed)
        )
    }
}

/// Caller-supplied fields for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Short human-readable title.
    pub title: String,
    /// Opaque description payload.
    pub description: String,
    /// Reward in minor currency units; must be non-negative.
    pub reward: i64,
    /// Scheduling priority; higher values are served first.
    pub priority: i32,
    /// Optional absolute expiry (ms since epoch).
    pub expires_at_ms: Option<u128>,
    /// Staff member who created the task, when known.
    pub created_by: Option<WorkerId>,
    /// Whether the dispatch scheduler should offer this task proactively.
    pub auto_assign: bool,
    /// Game platform the worker must be verified on, if any.
    pub required_platform: Option<String>,
    /// Rank label the worker's verification must carry, if any.
    pub required_rank: Option<String>,
}

impl TaskDraft {
    /// Validate draft fields before insertion.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Validation`] for an empty title or a
    /// negative reward.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.title.trim().is_empty() {
            return Err(DispatchError::Validation("title must not be empty".into()));
        }
        if self.reward < 0 {
            return Err(DispatchError::Validation(format!(
                "reward must be non-negative, got {}",
                self.reward
            )));
        }
        Ok(())
    }
}

/// Eligibility requirement a worker must satisfy to take a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequirement {
    /// Platform the worker must hold an approved verification for.
    pub platform: Option<String>,
    /// Rank label the verification must match (opaque equality).
    pub rank: Option<String>,
}

/// A durable task record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier.
    pub id: TaskId,
    /// Short human-readable title.
    pub title: String,
    /// Opaque description payload.
    pub description: String,
    /// Reward in minor currency units.
    pub reward: i64,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Scheduling priority; higher values are served first.
    pub priority: i32,
    /// Creation timestamp (ms since epoch).
    pub created_at_ms: u128,
    /// Last mutation timestamp (ms since epoch).
    pub updated_at_ms: u128,
    /// Optional absolute expiry (ms since epoch).
    pub expires_at_ms: Option<u128>,
    /// Staff member who created the task, when known.
    pub created_by: Option<WorkerId>,
    /// Worker holding the claim, if any.
    pub claimed_by: Option<WorkerId>,
    /// Worker the task was dispatched to, if any.
    pub assigned_to: Option<WorkerId>,
    /// When the claim was taken (ms since epoch).
    pub claimed_at_ms: Option<u128>,
    /// When the task was completed (ms since epoch).
    pub completed_at_ms: Option<u128>,
    /// Payable amount recorded at completion; equals `reward`.
    pub payout: Option<i64>,
    /// Number of dispatch offers issued so far; never decreases.
    pub reminder_count: u32,
    /// Whether the dispatch scheduler should offer this task proactively.
    pub auto_assign: bool,
    /// Game platform the worker must be verified on, if any.
    pub required_platform: Option<String>,
    /// Rank label the worker's verification must carry, if any.
    pub required_rank: Option<String>,
}

impl Task {
    /// Materialize a new open task from a validated draft.
    #[must_use]
    pub fn from_draft(id: TaskId, draft: TaskDraft, now_ms: u128) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            reward: draft.reward,
            status: TaskStatus::Open,
            priority: draft.priority,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            expires_at_ms: draft.expires_at_ms,
            created_by: draft.created_by,
            claimed_by: None,
            assigned_to: None,
            claimed_at_ms: None,
            completed_at_ms: None,
            payout: None,
            reminder_count: 0,
            auto_assign: draft.auto_assign,
            required_platform: draft.required_platform,
            required_rank: draft.required_rank,
        }
    }

    /// Whether the task's deadline has passed.
    #[must_use]
    pub fn is_expired(&self, now_ms: u128) -> bool {
        self.expires_at_ms.is_some_and(|at| now_ms > at)
    }

    /// The worker currently bound to this task, if any.
    #[must_use]
    pub fn holder(&self) -> Option<WorkerId> {
        self.claimed_by.or(self.assigned_to)
    }

    /// The eligibility requirement derived from the task's fields.
    #[must_use]
    pub fn requirement(&self) -> TaskRequirement {
        TaskRequirement {
            platform: self.required_platform.clone(),
            rank: self.required_rank.clone(),
        }
    }
}
