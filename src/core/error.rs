//! Error taxonomy for dispatch operations.

use thiserror::Error;

/// Errors produced by dispatch engine components.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed input; the caller must correct and resubmit.
    #[error("validation failed: {0}")]
    Validation(String),
    /// An optimistic-concurrency precondition failed. Expected under
    /// contention; callers must not blindly retry against the same record.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Authorization failure; fatal to the request, never retried.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// The referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Transient infrastructure failure; safe to retry with backoff because
    /// CAS preconditions make retries idempotent.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl DispatchError {
    /// Whether a caller may transparently retry the failed operation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
