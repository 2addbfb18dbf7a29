//! Tests for the in-memory notification bus

use hall_dispatch::core::{EventFilter, NotificationBus, TaskEvent};
use hall_dispatch::infra::bus::InMemoryBus;
use hall_dispatch::util::serde::{TaskId, WorkerId};

fn claimed(task_id: TaskId, worker_id: WorkerId) -> TaskEvent {
    TaskEvent::TaskClaimed {
        task_id,
        worker_id,
        at_ms: 1,
    }
}

#[tokio::test]
async fn test_filtered_subscribers_receive_only_their_events() {
    let bus = InMemoryBus::new();
    let watched = TaskId::new();
    let other = TaskId::new();
    let mut task_sub = bus.subscribe(EventFilter::for_task(watched));
    let mut all_sub = bus.subscribe(EventFilter::all());

    bus.publish(claimed(watched, WorkerId::new()));
    bus.publish(claimed(other, WorkerId::new()));

    assert_eq!(task_sub.try_recv().unwrap().task_id(), watched);
    assert!(task_sub.try_recv().is_none());
    assert!(all_sub.try_recv().is_some());
    assert!(all_sub.try_recv().is_some());
}

#[tokio::test]
async fn test_cancelled_subscriptions_are_pruned_on_publish() {
    let bus = InMemoryBus::new();
    let mut sub = bus.subscribe(EventFilter::all());
    assert_eq!(bus.subscriber_count(), 1);

    sub.cancel();
    bus.publish(claimed(TaskId::new(), WorkerId::new()));
    assert_eq!(bus.subscriber_count(), 0);
    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn test_dropped_subscriptions_do_not_block_publishing() {
    let bus = InMemoryBus::new();
    drop(bus.subscribe(EventFilter::all()));
    let mut live = bus.subscribe(EventFilter::all());

    bus.publish(claimed(TaskId::new(), WorkerId::new()));
    assert!(live.try_recv().is_some());
    assert_eq!(bus.subscriber_count(), 1);
}
