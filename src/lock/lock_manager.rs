use std::sync::Arc;

use super::{Lock, LockError};

/// Factory trait for obtaining per-resource locks.
///
/// `ManagedLockService` asks its manager for one lock per resource string.
/// The default `InMemoryLockManager` stores locks in a `HashMap`; distributed
/// implementations map the same names onto Redis keys, advisory lock ids, etc.
pub trait LockManager: Send + Sync {
    /// The concrete lock type returned by this manager.
    type Lock: Lock + 'static;

    /// Get (or create) the lock for the given resource.
    ///
    /// Repeated calls with the same `id` must return the same logical lock
    /// (i.e. the same `Arc` for in-memory, or the same distributed key).
    fn get_lock(&self, id: &str) -> Result<Arc<Self::Lock>, LockError>;
}
