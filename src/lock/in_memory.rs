use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{Lock, LockError, LockManager};

/// In-memory lock backed by `Mutex<bool>` + `Condvar`.
///
/// Mutual exclusion only holds inside one process. It is the default backend
/// for tests and single-node deployments.
pub struct InMemoryLock {
    held: Mutex<bool>,
    released: Condvar,
}

fn poisoned<T>(err: PoisonError<T>) -> LockError {
    LockError::Poisoned(err.to_string())
}

impl InMemoryLock {
    pub fn new() -> Self {
        InMemoryLock {
            held: Mutex::new(false),
            released: Condvar::new(),
        }
    }

    /// Whether the lock is currently held.
    pub fn is_locked(&self) -> Result<bool, LockError> {
        Ok(*self.held()?)
    }

    fn held(&self) -> Result<MutexGuard<'_, bool>, LockError> {
        self.held.lock().map_err(poisoned)
    }
}

impl Default for InMemoryLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Lock for InMemoryLock {
    fn lock(&self) -> Result<(), LockError> {
        let held = self.held()?;
        let mut held = self.released.wait_while(held, |held| *held).map_err(poisoned)?;
        *held = true;
        Ok(())
    }

    fn try_lock(&self) -> Result<bool, LockError> {
        let mut held = self.held()?;
        if *held {
            return Ok(false);
        }
        *held = true;
        Ok(true)
    }

    fn try_lock_for(&self, timeout: Duration) -> Result<bool, LockError> {
        let held = self.held()?;
        let (mut held, waited) = self
            .released
            .wait_timeout_while(held, timeout, |held| *held)
            .map_err(poisoned)?;
        if waited.timed_out() && *held {
            return Ok(false);
        }
        *held = true;
        Ok(true)
    }

    fn unlock(&self) -> Result<(), LockError> {
        let mut held = self.held()?;
        if std::mem::replace(&mut *held, false) {
            self.released.notify_one();
        }
        Ok(())
    }
}

/// In-memory lock manager backed by a `HashMap<String, Arc<InMemoryLock>>`.
///
/// Lazily creates one `InMemoryLock` per resource name and returns the same
/// `Arc` for repeated lookups.
pub struct InMemoryLockManager {
    locks: Mutex<HashMap<String, Arc<InMemoryLock>>>,
}

impl InMemoryLockManager {
    pub fn new() -> Self {
        InMemoryLockManager {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LockManager for InMemoryLockManager {
    type Lock = InMemoryLock;

    fn get_lock(&self, id: &str) -> Result<Arc<InMemoryLock>, LockError> {
        let mut locks = self.locks.lock().map_err(poisoned)?;
        let lock = locks.entry(id.to_string()).or_default();
        Ok(Arc::clone(lock))
    }
}
