//! Tests for the API surface

use std::sync::Arc;

use hall_dispatch::builders::build_engine;
use hall_dispatch::config::EngineConfig;
use hall_dispatch::core::{
    InMemoryDirectory, Role, TaskDraft, TaskStatus, WorkerProfile, WorkerStatus,
};
use hall_dispatch::runtime::{
    claim_task, create_task, health, task_status, ClaimRequest, ClaimResponse, CreateTaskRequest,
};
use hall_dispatch::util::clock::SystemClock;
use hall_dispatch::util::serde::WorkerId;

fn worker(role: Role) -> WorkerProfile {
    WorkerProfile {
        id: WorkerId::new(),
        role,
        status: WorkerStatus::Active,
        reputation: 10,
        verified_platforms: Vec::new(),
        last_idle_at_ms: 0,
    }
}

fn draft() -> TaskDraft {
    TaskDraft {
        title: "account recovery".into(),
        description: "restore rank".into(),
        reward: 500,
        priority: 1,
        expires_at_ms: None,
        created_by: None,
        auto_assign: false,
        required_platform: None,
        required_rank: None,
    }
}

#[tokio::test]
async fn test_create_claim_and_status_flow() {
    let directory = Arc::new(InMemoryDirectory::new());
    let staff = worker(Role::Csr);
    let player = worker(Role::Player);
    directory.upsert(staff.clone());
    directory.upsert(player.clone());
    let engine = build_engine(
        &EngineConfig::default(),
        directory,
        Arc::new(SystemClock),
        None,
    )
    .unwrap();

    let task_id = create_task(
        &engine,
        CreateTaskRequest {
            actor_id: staff.id,
            draft: draft(),
        },
    )
    .await
    .unwrap();

    let response = claim_task(
        &engine,
        ClaimRequest {
            task_id,
            worker_id: player.id,
        },
    )
    .await
    .unwrap();
    assert!(matches!(response, ClaimResponse::Claimed { task_id: t } if t == task_id));

    let status = task_status(&engine, task_id).await.unwrap();
    assert_eq!(status.status, TaskStatus::Claimed);
    assert_eq!(status.claimed_by, Some(player.id));
    assert_eq!(status.reminder_count, 0);
}

#[tokio::test]
async fn test_losing_claim_is_a_rejection_response() {
    let directory = Arc::new(InMemoryDirectory::new());
    let staff = worker(Role::Csr);
    let first = worker(Role::Player);
    let second = worker(Role::Player);
    directory.upsert(staff.clone());
    directory.upsert(first.clone());
    directory.upsert(second.clone());
    let engine = build_engine(
        &EngineConfig::default(),
        directory,
        Arc::new(SystemClock),
        None,
    )
    .unwrap();

    let task_id = create_task(
        &engine,
        CreateTaskRequest {
            actor_id: staff.id,
            draft: draft(),
        },
    )
    .await
    .unwrap();

    claim_task(
        &engine,
        ClaimRequest {
            task_id,
            worker_id: first.id,
        },
    )
    .await
    .unwrap();
    let response = claim_task(
        &engine,
        ClaimRequest {
            task_id,
            worker_id: second.id,
        },
    )
    .await
    .unwrap();
    assert!(matches!(response, ClaimResponse::Rejected { .. }));
}

#[test]
fn test_claim_response_serialization_is_tagged() {
    let rejected = ClaimResponse::Rejected {
        reason: hall_dispatch::core::ClaimRejection::AlreadyClaimed,
    };
    let json = serde_json::to_value(&rejected).unwrap();
    assert_eq!(json["result"], "rejected");
    assert_eq!(json["reason"], "already_claimed");
}

#[test]
fn test_health() {
    assert!(health().ok);
}
