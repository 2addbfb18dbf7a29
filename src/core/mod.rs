//! Core dispatch abstractions: tasks, claims, scheduling, and events.

pub mod audit;
pub mod claim;
pub mod error;
pub mod event;
pub mod scheduler;
pub mod store;
pub mod task;
pub mod worker;

pub use audit::{build_audit_event, AuditEvent, AuditSink, InMemoryAuditSink, PostgresAuditSink};
pub use claim::{ClaimCoordinator, ClaimOutcome, ClaimPolicy, ClaimRejection};
pub use error::{AppResult, DispatchError};
pub use event::{EventFilter, NotificationBus, Subscription, TaskEvent};
pub use scheduler::{DispatchConfig, DispatchScheduler, Spawn};
pub use store::{Reminder, ReminderStatus, ReminderStore, StatusMutator, TaskStore};
pub use task::{Task, TaskDraft, TaskRequirement, TaskStatus};
pub use worker::{
    InMemoryDirectory, Permission, Role, VerifiedPlatform, WorkerDirectory, WorkerProfile,
    WorkerStatus,
};
