//! Assemble a configured dispatch engine from its parts.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::{BusBackendConfig, EngineConfig, StoreBackendConfig};
use crate::core::audit::AuditSink;
use crate::core::claim::{ClaimCoordinator, ClaimPolicy};
use crate::core::event::NotificationBus;
use crate::core::scheduler::{DispatchConfig, DispatchScheduler};
use crate::core::store::{ReminderStore, TaskStore};
use crate::core::worker::WorkerDirectory;
use crate::util::clock::Clock;
use crate::infra::bus::InMemoryBus;
use crate::infra::store::{InMemoryStore, PostgresStore};

/// A fully wired engine: coordinator, scheduler, and their shared backends.
pub struct DispatchEngine {
    /// Claim/complete/cancel entry point.
    pub coordinator: Arc<ClaimCoordinator>,
    /// Auto-dispatch scheduler.
    pub scheduler: Arc<DispatchScheduler>,
    /// Event fan-out shared by both.
    pub bus: Arc<dyn NotificationBus>,
    /// Task store shared by both.
    pub store: Arc<dyn TaskStore>,
}

/// Build an engine from validated configuration.
///
/// The in-memory store backs both tasks and reminders. The postgres
/// backend constructs an unwired adapter whose operations fail until a
/// database client is attached.
///
/// # Errors
///
/// A validation message when the configuration is rejected.
pub fn build_engine(
    cfg: &EngineConfig,
    directory: Arc<dyn WorkerDirectory>,
    clock: Arc<dyn Clock>,
    audit: Option<Box<dyn AuditSink>>,
) -> Result<DispatchEngine, String> {
    cfg.validate()?;

    let (store, reminders): (Arc<dyn TaskStore>, Arc<dyn ReminderStore>) = match cfg.store {
        StoreBackendConfig::InMemory => {
            let shared = Arc::new(InMemoryStore::with_clock(Arc::clone(&clock)));
            (
                Arc::clone(&shared) as Arc<dyn TaskStore>,
                shared as Arc<dyn ReminderStore>,
            )
        }
        StoreBackendConfig::Postgres => {
            let shared = Arc::new(PostgresStore::new());
            (
                Arc::clone(&shared) as Arc<dyn TaskStore>,
                shared as Arc<dyn ReminderStore>,
            )
        }
    };

    let bus: Arc<dyn NotificationBus> = match cfg.bus {
        BusBackendConfig::InMemory => Arc::new(InMemoryBus::new()),
    };

    let policy = ClaimPolicy {
        complete_from_claimed: cfg.claim.complete_from_claimed,
        max_store_retries: cfg.claim.max_store_retries,
        retry_backoff: Duration::from_millis(cfg.claim.retry_backoff_ms),
    };
    let dispatch = DispatchConfig {
        tick_interval: Duration::from_secs(cfg.dispatch.tick_interval_secs),
        ack_window_ms: cfg.dispatch.ack_window_secs * 1000,
        max_escalations: cfg.dispatch.max_escalations,
    };

    let audit = audit.map(|sink| Arc::new(Mutex::new(sink)));

    let mut coordinator = ClaimCoordinator::new(
        Arc::clone(&store),
        Arc::clone(&directory),
        Arc::clone(&bus),
        Arc::clone(&clock),
        policy,
    );
    let mut scheduler = DispatchScheduler::new(
        Arc::clone(&store),
        reminders,
        directory,
        Arc::clone(&bus),
        clock,
        dispatch,
    );
    if let Some(sink) = &audit {
        coordinator = coordinator.with_audit(Arc::clone(sink));
        scheduler = scheduler.with_audit(Arc::clone(sink));
    }

    Ok(DispatchEngine {
        coordinator: Arc::new(coordinator),
        scheduler: Arc::new(scheduler),
        bus,
        store,
    })
}
