use thiserror::Error;

/// Error type for lock operations.
///
/// The guard branches on two acquisition outcomes: `Conflicted` (another
/// holder kept the resource past every retry) and everything else raised
/// while acquiring, which it treats as an infrastructure failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// Another holder kept the resource after contention handling was exhausted.
    #[error("lock conflicted on resource {resource}")]
    Conflicted { resource: String },
    /// The lock backend could not be reached or refused the request.
    #[error("lock acquire failed: {0}")]
    AcquireFailed(String),
    /// The underlying lock primitive was poisoned (e.g. a thread panicked while holding it).
    #[error("lock poisoned: {0}")]
    Poisoned(String),
    /// Failed to release the lock.
    #[error("lock release failed: {0}")]
    ReleaseFailed(String),
    /// The lock expired (e.g. a distributed lock TTL elapsed) while the body ran.
    #[error("lock expired: {0}")]
    Expired(String),
    /// Any other lock error.
    #[error("lock error: {0}")]
    Other(String),
}

impl LockError {
    /// Create a conflict error for the given resource.
    pub fn conflicted(resource: impl Into<String>) -> Self {
        LockError::Conflicted {
            resource: resource.into(),
        }
    }

    /// `true` when the error is contention rather than a backend problem.
    pub fn is_conflict(&self) -> bool {
        matches!(self, LockError::Conflicted { .. })
    }

    /// `true` when the lock could not be taken: contention or a failed acquire.
    /// Expiry, release and poisoning errors are not included.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, LockError::Conflicted { .. } | LockError::AcquireFailed(_))
    }
}
