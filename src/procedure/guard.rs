//! Guard — lock-and-replay wrapper around lockable procedures.
//!
//! For every request the guard:
//!
//! 1. resolves the procedure's lock resources; an empty set runs the
//!    procedure directly,
//! 2. replays a cached result when the procedure has an idempotency key,
//! 3. acquires every resource through the `LockService`,
//! 4. executes the procedure and caches its result while still holding
//!    the lock,
//! 5. releases the lock on every path.
//!
//! Lock conflicts and acquisition failures re-check the cache (a concurrent
//! holder may have just finished) before turning into
//! `HandlerError::TryAgain`. Other failures pass through when they are
//! caller-facing, and are otherwise logged and either retried once without
//! the lock or returned as-is.

use std::sync::Arc;

use serde_json::Value;

use super::config::GuardConfig;
use super::principal::{PrincipalResolver, SessionPrincipal};
use super::procedure::LockableProcedure;
use super::resource::filter_resources;
use crate::cache::{CacheStore, InMemoryCache};
use crate::lock::{
    ExclusiveError, InMemoryLockManager, LockError, LockService, LockServiceExt, ManagedLockService,
};
use crate::logger::procedure_span;
use crate::microsvc::{Context, HandlerError};

/// Runs lockable procedures under their locks.
///
/// Collaborators are injected once and shared by every procedure routed
/// through the guard. Cheap to share behind an `Arc`.
pub struct Guard {
    locks: Arc<dyn LockService>,
    cache: Arc<dyn CacheStore>,
    principal: Arc<dyn PrincipalResolver>,
    config: GuardConfig,
}

impl Guard {
    /// Build a guard over the given lock service and cache store.
    ///
    /// Principals come from the session user id and the configuration is
    /// `GuardConfig::default()` until overridden.
    pub fn new<L, C>(locks: L, cache: C) -> Self
    where
        L: LockService + 'static,
        C: CacheStore + 'static,
    {
        Self {
            locks: Arc::new(locks),
            cache: Arc::new(cache),
            principal: Arc::new(SessionPrincipal),
            config: GuardConfig::default(),
        }
    }

    /// Process-local guard: in-memory locks and cache.
    pub fn in_memory() -> Self {
        Self::new(
            ManagedLockService::new(InMemoryLockManager::new()),
            InMemoryCache::new(),
        )
    }

    /// Use a different principal resolver.
    pub fn principal<P: PrincipalResolver + 'static>(mut self, principal: P) -> Self {
        self.principal = Arc::new(principal);
        self
    }

    /// Replace the configuration.
    pub fn config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn settings(&self) -> &GuardConfig {
        &self.config
    }

    /// The names this request would lock. Empty means the procedure runs unguarded.
    pub fn resolve<S, P>(&self, procedure: &P, ctx: &Context<S>) -> Vec<String>
    where
        P: LockableProcedure<S> + ?Sized,
    {
        if !ctx.has_params() {
            return Vec::new();
        }
        let principal = self.principal.current_principal(ctx.session());
        procedure
            .lock_resources(ctx, principal.as_deref())
            .map(filter_resources)
            .unwrap_or_default()
    }

    /// Run `procedure` for `ctx` under its lock.
    pub fn invoke<S, P>(&self, procedure: &P, ctx: &Context<S>) -> Result<Value, HandlerError>
    where
        P: LockableProcedure<S> + ?Sized,
    {
        let name = procedure.procedure_name();
        let _span = procedure_span(&name).entered();
        let resources = self.resolve(procedure, ctx);
        if resources.is_empty() {
            tracing::debug!(procedure = %name, "no lock resources, running unguarded");
            return procedure.execute(ctx);
        }

        let cache_key = procedure.idempotency_key(ctx);
        if let Some(hit) = self.replay(cache_key.as_deref())? {
            tracing::debug!(procedure = %name, "replaying cached result");
            return Ok(hit);
        }

        let outcome = self
            .locks
            .run_exclusive(&resources, || -> Result<Value, HandlerError> {
                let result = procedure.execute(ctx)?;
                self.remember(&name, cache_key.as_deref(), &result)?;
                Ok(result)
            });

        match outcome {
            Ok(result) => Ok(result),
            Err(ExclusiveError::Lock(err)) => self.recover_from_lock(&name, cache_key.as_deref(), err),
            // a nested lock taken by the body fails the same way as our own
            Err(ExclusiveError::Body(HandlerError::Lock(err))) if err.is_unavailable() => {
                self.recover_from_lock(&name, cache_key.as_deref(), err)
            }
            Err(ExclusiveError::Body(err)) => self.recover_from_failure(procedure, ctx, &name, err),
        }
    }

    /// Cached result for `key`. JSON `null` and `false` read as a miss.
    fn replay(&self, key: Option<&str>) -> Result<Option<Value>, HandlerError> {
        let Some(key) = key else {
            return Ok(None);
        };
        let cached = self.cache.get(key)?;
        Ok(cached.filter(|value| !matches!(value, Value::Null | Value::Bool(false))))
    }

    fn remember(&self, procedure: &str, key: Option<&str>, result: &Value) -> Result<(), HandlerError> {
        let Some(key) = key else {
            return Ok(());
        };
        match self.cache.set(key, result.clone(), self.config.cache_ttl()) {
            Ok(()) => Ok(()),
            Err(err) if self.config.propagate_cache_write_errors => Err(err.into()),
            Err(err) => {
                tracing::warn!(procedure, key, error = %err, "failed to cache result, replay disabled for this request");
                Ok(())
            }
        }
    }

    fn recover_from_lock(
        &self,
        procedure: &str,
        key: Option<&str>,
        err: LockError,
    ) -> Result<Value, HandlerError> {
        if let Some(hit) = self.replay(key)? {
            tracing::debug!(procedure, error = %err, "lock unavailable, replaying result of concurrent holder");
            return Ok(hit);
        }

        tracing::warn!(procedure, error = %err, "lock unavailable");
        let message = if err.is_conflict() {
            &self.config.conflict_message
        } else {
            &self.config.acquire_failure_message
        };
        Err(HandlerError::try_again(message.clone(), err))
    }

    fn recover_from_failure<S, P>(
        &self,
        procedure: &P,
        ctx: &Context<S>,
        name: &str,
        err: HandlerError,
    ) -> Result<Value, HandlerError>
    where
        P: LockableProcedure<S> + ?Sized,
    {
        if err.is_friendly() {
            return Err(err);
        }

        tracing::error!(
            error = %err,
            params = %ctx.raw_input(),
            procedure = name,
            "procedure failed while holding its lock"
        );

        if procedure.fallback_retry() {
            tracing::warn!(procedure = name, "retrying without lock");
            return procedure.execute(ctx);
        }
        Err(err)
    }
}
