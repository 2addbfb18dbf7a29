//! Tracing bootstrap for the dispatch engine.
//!
//! Claim, scheduler, and store activity logs under the `hall_dispatch`
//! target; `RUST_LOG=hall_dispatch=debug` surfaces per-tick detail.

/// Install an env-filtered subscriber unless the host application already
/// set one. Without `RUST_LOG`, engine logs default to `info`.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hall_dispatch=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
