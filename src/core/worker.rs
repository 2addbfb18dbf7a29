//! Worker profiles, roles, and the role/permission table.
//!
//! Worker records are read-only inputs to the engine: they are owned by an
//! external identity/profile service reached through [`WorkerDirectory`].
//! [`InMemoryDirectory`] is the development/test double for that service.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::task::TaskRequirement;
use crate::core::DispatchError;
use crate::util::serde::WorkerId;

/// Role of an account in the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Registered account without worker privileges.
    User,
    /// Worker who may claim and run tasks.
    Player,
    /// Customer-service staff.
    Csr,
    /// Administrator.
    Admin,
    /// Administrator with full authority.
    SuperAdmin,
}

/// A capability granted to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Browse the open task list.
    ViewTasks,
    /// Take exclusive ownership of open tasks.
    ClaimTasks,
    /// Create new tasks.
    CreateTasks,
    /// Mutate tasks one currently holds.
    ManageOwnTasks,
    /// Cancel tasks held by other workers.
    CancelTasks,
    /// Review worker identity/platform verifications.
    ReviewVerifications,
    /// Manage user accounts.
    ManageUsers,
}

impl Role {
    /// Permissions granted to this role.
    #[must_use]
    pub const fn permissions(self) -> &'static [Permission] {
        use Permission as P;
        match self {
            Self::User => &[P::ViewTasks],
            Self::Player => &[P::ViewTasks, P::ClaimTasks, P::ManageOwnTasks],
            Self::Csr => &[
                P::ViewTasks,
                P::ClaimTasks,
                P::ManageOwnTasks,
                P::CreateTasks,
                P::CancelTasks,
            ],
            Self::Admin => &[
                P::ViewTasks,
                P::ClaimTasks,
                P::ManageOwnTasks,
                P::CreateTasks,
                P::CancelTasks,
                P::ReviewVerifications,
                P::ManageUsers,
            ],
            Self::SuperAdmin => &[
                P::ViewTasks,
                P::ClaimTasks,
                P::ManageOwnTasks,
                P::CreateTasks,
                P::CancelTasks,
                P::ReviewVerifications,
                P::ManageUsers,
            ],
        }
    }

    /// Whether this role carries the given permission.
    #[must_use]
    pub fn has_permission(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

/// Account standing of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// In good standing; may claim tasks.
    Active,
    /// Blocked from all worker operations.
    Suspended,
    /// Awaiting verification; not yet eligible.
    Pending,
}

/// An approved platform verification held by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedPlatform {
    /// Platform key (e.g. a game identifier).
    pub platform: String,
    /// Verified rank label, if the platform tracks one.
    pub rank: Option<String>,
}

/// Read-only profile of a worker as seen by the dispatch engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerProfile {
    /// Unique identifier (shared with the identity service).
    pub id: WorkerId,
    /// Account role.
    pub role: Role,
    /// Account standing.
    pub status: WorkerStatus,
    /// Reputation score; higher ranks first for auto-dispatch.
    pub reputation: i64,
    /// Approved platform verifications.
    pub verified_platforms: Vec<VerifiedPlatform>,
    /// When the worker last became idle (ms since epoch); recency breaks
    /// reputation ties.
    pub last_idle_at_ms: u128,
}

impl WorkerProfile {
    /// Whether the account is in good standing.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == WorkerStatus::Active
    }

    /// Whether the worker satisfies a task's eligibility requirement.
    ///
    /// The rank label is an opaque equality match; no ordering is assumed.
    #[must_use]
    pub fn meets(&self, requirement: &TaskRequirement) -> bool {
        let Some(platform) = &requirement.platform else {
            return true;
        };
        self.verified_platforms.iter().any(|v| {
            v.platform == *platform
                && requirement
                    .rank
                    .as_ref()
                    .is_none_or(|rank| v.rank.as_ref() == Some(rank))
        })
    }
}

/// Lookup interface onto the external identity/profile service.
#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    /// Fetch a worker profile by id.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] for unknown workers, or
    /// [`DispatchError::Unavailable`] when the service cannot be reached.
    async fn get(&self, id: WorkerId) -> Result<WorkerProfile, DispatchError>;

    /// All active workers eligible for the given requirement, in no
    /// particular order. Ranking is the scheduler's concern.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Unavailable`] when the service cannot be reached.
    async fn available_for(
        &self,
        requirement: &TaskRequirement,
    ) -> Result<Vec<WorkerProfile>, DispatchError>;
}

/// In-memory worker directory for development and testing.
#[derive(Default)]
pub struct InMemoryDirectory {
    workers: RwLock<HashMap<WorkerId, WorkerProfile>>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a worker profile.
    pub fn upsert(&self, profile: WorkerProfile) {
        self.workers.write().insert(profile.id, profile);
    }

    /// Remove a worker profile.
    pub fn remove(&self, id: WorkerId) {
        self.workers.write().remove(&id);
    }
}

#[async_trait]
impl WorkerDirectory for InMemoryDirectory {
    async fn get(&self, id: WorkerId) -> Result<WorkerProfile, DispatchError> {
        self.workers
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| DispatchError::NotFound(format!("worker {id}")))
    }

    async fn available_for(
        &self,
        requirement: &TaskRequirement,
    ) -> Result<Vec<WorkerProfile>, DispatchError> {
        Ok(self
            .workers
            .read()
            .values()
            .filter(|w| {
                w.is_active() && w.role.has_permission(Permission::ClaimTasks) && w.meets(requirement)
            })
            .cloned()
            .collect())
    }
}
