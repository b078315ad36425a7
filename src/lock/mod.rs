//! Lock collaborator.
//!
//! `Lock` and `LockManager` are the per-resource primitives; `LockService`
//! is what the guard consumes, acquiring a whole resource set atomically and
//! handing back a `LockHandle`.

mod error;
mod in_memory;
mod lock;
mod lock_manager;
mod service;

pub use error::LockError;
pub use in_memory::{InMemoryLock, InMemoryLockManager};
pub use lock::Lock;
pub use lock_manager::LockManager;
pub use service::{
    ExclusiveError, LockHandle, LockService, LockServiceExt, ManagedLockService, DEFAULT_ATTEMPTS,
    DEFAULT_BACKOFF, DEFAULT_WAIT,
};
