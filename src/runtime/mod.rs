//! Runtime adapters and API surface.

/// Request/response models and thin entry points.
pub mod api;
/// Tokio-backed spawner.
pub mod tokio_spawner;

pub use api::{claim_task, create_task, health, task_status, ClaimRequest, ClaimResponse, CreateTaskRequest, Health, TaskStatusResponse};
pub use tokio_spawner::TokioSpawner;
