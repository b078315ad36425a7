//! Multi-resource lock acquisition.
//!
//! `LockService` is the narrow interface the guard consumes: acquire every
//! resource of a request at once, get a `LockHandle` back, release it when
//! the body is done. `ManagedLockService` implements it on top of any
//! `LockManager`.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::{Lock, LockError, LockManager};

/// Default time to wait for each resource before counting an attempt as contended.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// Default number of whole-set acquisition attempts.
pub const DEFAULT_ATTEMPTS: u32 = 1;

/// Default pause between attempts, multiplied by the attempt number.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

type ReleaseFn = Box<dyn FnOnce() -> Result<(), LockError> + Send>;

/// Exclusivity over a set of resources, held until released or dropped.
///
/// Dropping a handle without calling `release` still releases it (the
/// error, if any, is logged), so a panicking body cannot leak a lock.
pub struct LockHandle {
    resources: Vec<String>,
    release: Option<ReleaseFn>,
}

impl LockHandle {
    /// Wrap a release callback for the given resources.
    pub fn new<F>(resources: Vec<String>, release: F) -> Self
    where
        F: FnOnce() -> Result<(), LockError> + Send + 'static,
    {
        LockHandle {
            resources,
            release: Some(Box::new(release)),
        }
    }

    /// The resources this handle holds.
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Release the lock, reporting backend errors.
    pub fn release(mut self) -> Result<(), LockError> {
        match self.release.take() {
            Some(release) => release(),
            None => Ok(()),
        }
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            if let Err(err) = release() {
                tracing::warn!(error = %err, resources = ?self.resources, "failed to release dropped lock handle");
            }
        }
    }
}

impl fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("resources", &self.resources)
            .field("held", &self.release.is_some())
            .finish()
    }
}

/// Cluster-wide (or process-wide) exclusivity over named resources.
///
/// `acquire` is atomic over the whole set: either every resource is held
/// when it returns `Ok`, or none is. Implementations block the caller while
/// they wait and own any timeout or backoff policy.
pub trait LockService: Send + Sync {
    /// Acquire every resource, or fail with `LockError::Conflicted` when
    /// contention outlasts the wait policy and another variant on backend
    /// failure.
    fn acquire(&self, resources: &[String]) -> Result<LockHandle, LockError>;
}

impl<T: LockService + ?Sized> LockService for Arc<T> {
    fn acquire(&self, resources: &[String]) -> Result<LockHandle, LockError> {
        (**self).acquire(resources)
    }
}

/// Outcome of `run_exclusive` when it does not produce a value.
#[derive(Debug)]
pub enum ExclusiveError<E> {
    /// The lock could not be acquired; the body never ran.
    Lock(LockError),
    /// The body ran under the lock and failed.
    Body(E),
}

/// Run-under-lock helper available on every `LockService`.
pub trait LockServiceExt: LockService {
    /// Acquire `resources`, run `body`, release.
    ///
    /// Release happens on every exit path. A release failure after the body
    /// finished is logged and does not replace the body's outcome.
    fn run_exclusive<T, E, F>(&self, resources: &[String], body: F) -> Result<T, ExclusiveError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let handle = self.acquire(resources).map_err(ExclusiveError::Lock)?;
        let outcome = body();
        if let Err(err) = handle.release() {
            tracing::warn!(error = %err, resources = ?resources, "failed to release lock");
        }
        outcome.map_err(ExclusiveError::Body)
    }
}

impl<T: LockService + ?Sized> LockServiceExt for T {}

enum Attempt<L> {
    Held(Vec<Arc<L>>),
    Contended(String),
}

/// `LockService` over a `LockManager`.
///
/// Resources are deduplicated and locked in sorted order so two requests
/// sharing resources can never deadlock each other. Each resource is waited
/// on for `wait` (or indefinitely when `wait` is `None`). If any resource is
/// still held, everything taken so far is released and the whole set is
/// retried after `backoff * attempt`, up to `attempts` times.
pub struct ManagedLockService<M> {
    manager: M,
    wait: Option<Duration>,
    attempts: u32,
    backoff: Duration,
}

impl<M: LockManager> ManagedLockService<M> {
    pub fn new(manager: M) -> Self {
        ManagedLockService {
            manager,
            wait: Some(DEFAULT_WAIT),
            attempts: DEFAULT_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Per-resource wait before an attempt counts as contended.
    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = Some(wait);
        self
    }

    /// Block on each resource until it is free. Contention never fails.
    pub fn wait_indefinitely(mut self) -> Self {
        self.wait = None;
        self
    }

    /// Number of whole-set attempts (at least one).
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Base pause between attempts.
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Access the underlying manager.
    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// Pause after the `attempt`-th contended attempt. Grows linearly and
    /// saturates at `Duration::MAX`.
    fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }

    fn try_acquire_all(&self, ordered: &[&str]) -> Result<Attempt<M::Lock>, LockError> {
        let mut held: Vec<Arc<M::Lock>> = Vec::with_capacity(ordered.len());
        for id in ordered {
            let taken = self.manager.get_lock(id).and_then(|lock| {
                let acquired = match self.wait {
                    Some(wait) => lock.try_lock_for(wait)?,
                    None => {
                        lock.lock()?;
                        true
                    }
                };
                Ok((lock, acquired))
            });

            match taken {
                Ok((lock, true)) => held.push(lock),
                Ok((_, false)) => {
                    unlock_all(&held);
                    return Ok(Attempt::Contended(id.to_string()));
                }
                Err(err) => {
                    unlock_all(&held);
                    return Err(err);
                }
            }
        }
        Ok(Attempt::Held(held))
    }
}

impl<M> LockService for ManagedLockService<M>
where
    M: LockManager,
{
    fn acquire(&self, resources: &[String]) -> Result<LockHandle, LockError> {
        let mut ordered: Vec<&str> = resources.iter().map(String::as_str).collect();
        ordered.sort_unstable();
        ordered.dedup();

        let mut attempt = 1;
        loop {
            match self.try_acquire_all(&ordered).map_err(into_acquire_failure)? {
                Attempt::Held(held) => {
                    return Ok(LockHandle::new(resources.to_vec(), move || release_all(held)));
                }
                Attempt::Contended(resource) if attempt >= self.attempts => {
                    return Err(LockError::conflicted(resource));
                }
                Attempt::Contended(resource) => {
                    tracing::debug!(%resource, attempt, "lock contended, backing off");
                    thread::sleep(self.backoff_for(attempt));
                    attempt += 1;
                }
            }
        }
    }
}

/// Any backend error raised while acquiring is an acquisition failure.
fn into_acquire_failure(err: LockError) -> LockError {
    match err {
        LockError::Conflicted { .. } | LockError::AcquireFailed(_) => err,
        other => LockError::AcquireFailed(other.to_string()),
    }
}

fn unlock_all<L: Lock>(held: &[Arc<L>]) {
    for lock in held.iter().rev() {
        if let Err(err) = lock.unlock() {
            tracing::warn!(error = %err, "failed to roll back partial lock acquisition");
        }
    }
}

fn release_all<L: Lock>(held: Vec<Arc<L>>) -> Result<(), LockError> {
    let mut first_error = None;
    for lock in held.iter().rev() {
        if let Err(err) = lock.unlock() {
            first_error.get_or_insert(LockError::ReleaseFailed(err.to_string()));
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
