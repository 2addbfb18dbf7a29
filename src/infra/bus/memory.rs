//! In-memory notification bus with filtered fan-out.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::core::event::{EventFilter, NotificationBus, Subscription, TaskEvent};

struct Subscriber {
    id: u64,
    filter: EventFilter,
    tx: mpsc::UnboundedSender<TaskEvent>,
    cancelled: Arc<AtomicBool>,
}

/// Fan-out bus delivering events over per-subscriber unbounded channels.
///
/// Publishing happens under one short mutex, which gives every subscriber
/// the same per-task causal order. Dead or cancelled subscribers are pruned
/// on the next publish; nothing is retried.
#[derive(Default)]
pub struct InMemoryBus {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl InMemoryBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions (for diagnostics).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl NotificationBus for InMemoryBus {
    fn publish(&self, event: TaskEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| {
            if s.cancelled.load(Ordering::Acquire) {
                tracing::debug!(subscriber = s.id, "pruning cancelled subscriber");
                return false;
            }
            if !s.filter.matches(&event) {
                return true;
            }
            if s.tx.send(event.clone()).is_err() {
                tracing::debug!(subscriber = s.id, "dropping disconnected subscriber");
                return false;
            }
            true
        });
    }

    fn subscribe(&self, filter: EventFilter) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push(Subscriber {
            id,
            filter,
            tx,
            cancelled: Arc::clone(&cancelled),
        });
        tracing::debug!(subscriber = id, "subscription opened");
        Subscription::new(rx, cancelled)
    }
}
