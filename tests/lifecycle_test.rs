//! Integration tests for the claim-to-completion lifecycle.
//!
//! Covers completion authority, payout recording, cancellation authority,
//! manual assignment, and the impossibility of leaving a terminal state.

use std::sync::Arc;

use hall_dispatch::core::{
    ClaimCoordinator, ClaimOutcome, ClaimPolicy, DispatchError, EventFilter, InMemoryDirectory,
    NotificationBus, Role, TaskDraft, TaskEvent, TaskStatus, TaskStore, WorkerProfile,
    WorkerStatus,
};
use hall_dispatch::infra::bus::InMemoryBus;
use hall_dispatch::infra::store::InMemoryStore;
use hall_dispatch::util::clock::ManualClock;
use hall_dispatch::util::serde::{TaskId, WorkerId};

struct Harness {
    store: Arc<InMemoryStore>,
    directory: Arc<InMemoryDirectory>,
    bus: Arc<InMemoryBus>,
    coordinator: ClaimCoordinator,
}

fn harness_with(policy: ClaimPolicy) -> Harness {
    hall_dispatch::util::telemetry::init_tracing();
    let clock = Arc::new(ManualClock::new(1_000));
    let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
    let directory = Arc::new(InMemoryDirectory::new());
    let bus = Arc::new(InMemoryBus::new());
    let coordinator = ClaimCoordinator::new(
        store.clone(),
        directory.clone(),
        bus.clone(),
        clock,
        policy,
    );
    Harness {
        store,
        directory,
        bus,
        coordinator,
    }
}

fn harness() -> Harness {
    harness_with(ClaimPolicy::default())
}

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
        title: "coaching session".into(),
        description: "one hour vod review".into(),
        reward: 1_200,
        priority: 3,
        expires_at_ms: None,
        created_by: None,
        auto_assign: false,
        required_platform: None,
        required_rank: None,
    }
}

async fn claimed_task(h: &Harness, claimant: &WorkerProfile) -> TaskId {
    let task = h.store.create(draft()).await.unwrap();
    let outcome = h.coordinator.claim(task.id, claimant.id).await.unwrap();
    assert!(matches!(outcome, ClaimOutcome::Claimed(_)));
    task.id
}

#[tokio::test]
async fn claimant_completes_and_payout_matches_reward() {
    let h = harness();
    let claimant = worker(Role::Player);
    h.directory.upsert(claimant.clone());
    let task_id = claimed_task(&h, &claimant).await;
    let mut sub = h.bus.subscribe(EventFilter::for_task(task_id));

    let done = h.coordinator.complete(task_id, claimant.id).await.unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.payout, Some(done.reward));
    assert!(done.completed_at_ms.is_some());

    let Some(TaskEvent::TaskCompleted { amount, .. }) = sub.try_recv() else {
        panic!("expected a completion event");
    };
    assert_eq!(amount, done.reward);
    assert!(sub.try_recv().is_none(), "completion publishes once");
}

#[tokio::test]
async fn stranger_cannot_complete_someone_elses_task() {
    let h = harness();
    let claimant = worker(Role::Player);
    let stranger = worker(Role::Player);
    h.directory.upsert(claimant.clone());
    h.directory.upsert(stranger.clone());
    let task_id = claimed_task(&h, &claimant).await;

    let err = h
        .coordinator
        .complete(task_id, stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Forbidden(_)));

    let stored = h.store.get(task_id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Claimed);
    assert_eq!(stored.claimed_by, Some(claimant.id));
    assert_eq!(stored.payout, None);
}

#[tokio::test]
async fn completion_from_claimed_honours_policy() {
    let strict = harness_with(ClaimPolicy {
        complete_from_claimed: false,
        ..ClaimPolicy::default()
    });
    let claimant = worker(Role::Player);
    strict.directory.upsert(claimant.clone());
    let task_id = claimed_task(&strict, &claimant).await;

    let err = strict
        .coordinator
        .complete(task_id, claimant.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Conflict(_)));

    // Starting the work makes it completable again.
    strict.coordinator.start(task_id, claimant.id).await.unwrap();
    let done = strict
        .coordinator
        .complete(task_id, claimant.id)
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
}

#[tokio::test]
async fn completed_tasks_never_leave_the_terminal_state() {
    let h = harness();
    let claimant = worker(Role::Player);
    let admin = worker(Role::Admin);
    h.directory.upsert(claimant.clone());
    h.directory.upsert(admin.clone());
    let task_id = claimed_task(&h, &claimant).await;
    h.coordinator.complete(task_id, claimant.id).await.unwrap();

    let cancel = h.coordinator.cancel(task_id, admin.id).await.unwrap_err();
    assert!(matches!(cancel, DispatchError::Conflict(_)));
    let again = h
        .coordinator
        .complete(task_id, claimant.id)
        .await
        .unwrap_err();
    assert!(matches!(again, DispatchError::Conflict(_)));
    assert_eq!(
        h.store.get(task_id).await.unwrap().status,
        TaskStatus::Completed
    );
}

#[tokio::test]
async fn holder_may_cancel_their_own_claim() {
    let h = harness();
    let claimant = worker(Role::Player);
    h.directory.upsert(claimant.clone());
    let task_id = claimed_task(&h, &claimant).await;

    let cancelled = h.coordinator.cancel(task_id, claimant.id).await.unwrap();
    assert_eq!(cancelled.status, TaskStatus::Cancelled);
    assert_eq!(cancelled.claimed_by, None);
    assert_eq!(cancelled.assigned_to, None);
}

#[tokio::test]
async fn cancelling_anothers_task_requires_staff_authority() {
    let h = harness();
    let claimant = worker(Role::Player);
    let stranger = worker(Role::Player);
    let csr = worker(Role::Csr);
    h.directory.upsert(claimant.clone());
    h.directory.upsert(stranger.clone());
    h.directory.upsert(csr.clone());
    let task_id = claimed_task(&h, &claimant).await;

    let err = h.coordinator.cancel(task_id, stranger.id).await.unwrap_err();
    assert!(matches!(err, DispatchError::Forbidden(_)));

    let cancelled = h.coordinator.cancel(task_id, csr.id).await.unwrap();
    assert_eq!(cancelled.status, TaskStatus::Cancelled);
}

#[tokio::test]
async fn in_progress_tasks_cannot_be_cancelled() {
    let h = harness();
    let claimant = worker(Role::Player);
    let admin = worker(Role::Admin);
    h.directory.upsert(claimant.clone());
    h.directory.upsert(admin.clone());
    let task_id = claimed_task(&h, &claimant).await;
    h.coordinator.start(task_id, claimant.id).await.unwrap();

    let err = h.coordinator.cancel(task_id, admin.id).await.unwrap_err();
    assert!(matches!(err, DispatchError::Conflict(_)));
}

#[tokio::test]
async fn staff_can_create_and_manually_assign() {
    let h = harness();
    let csr = worker(Role::Csr);
    let assignee = worker(Role::Player);
    h.directory.upsert(csr.clone());
    h.directory.upsert(assignee.clone());

    let task = h.coordinator.create(draft(), csr.id).await.unwrap();
    assert_eq!(task.created_by, Some(csr.id));

    let assigned = h
        .coordinator
        .assign(task.id, assignee.id, csr.id)
        .await
        .unwrap();
    assert_eq!(assigned.status, TaskStatus::Assigned);
    assert_eq!(assigned.assigned_to, Some(assignee.id));
    assert_eq!(assigned.claimed_by, Some(assignee.id));

    // The assignee may complete without a separate claim.
    let done = h
        .coordinator
        .complete(task.id, assignee.id)
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
}

#[tokio::test]
async fn assignment_cannot_displace_an_existing_claimant() {
    let h = harness();
    let csr = worker(Role::Csr);
    let claimant = worker(Role::Player);
    let rival = worker(Role::Player);
    h.directory.upsert(csr.clone());
    h.directory.upsert(claimant.clone());
    h.directory.upsert(rival.clone());
    let task_id = claimed_task(&h, &claimant).await;
    let mut sub = h.bus.subscribe(EventFilter::for_worker(claimant.id));

    let err = h
        .coordinator
        .assign(task_id, rival.id, csr.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Conflict(_)));

    let stored = h.store.get(task_id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Claimed);
    assert_eq!(stored.claimed_by, Some(claimant.id));
    assert!(sub.try_recv().is_none(), "the claimant saw no assignment");

    // Promoting the claimant themselves is still allowed.
    let promoted = h
        .coordinator
        .assign(task_id, claimant.id, csr.id)
        .await
        .unwrap();
    assert_eq!(promoted.status, TaskStatus::Assigned);
    assert_eq!(promoted.assigned_to, Some(claimant.id));
}

#[tokio::test]
async fn plain_users_cannot_create_tasks() {
    let h = harness();
    let user = worker(Role::User);
    h.directory.upsert(user.clone());

    let err = h.coordinator.create(draft(), user.id).await.unwrap_err();
    assert!(matches!(err, DispatchError::Forbidden(_)));
}
