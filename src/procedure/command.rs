//! Closure-backed lockable procedure.

use serde_json::Value;

use super::procedure::LockableProcedure;
use super::resource::{canonical_name, LockResource};
use crate::microsvc::{Context, HandlerError};

type HandleFn<S> = Box<dyn Fn(&Context<S>) -> Result<Value, HandlerError> + Send + Sync>;
type ResourcesFn<S> = Box<dyn Fn(&Context<S>, Option<&str>) -> Option<Vec<LockResource>> + Send + Sync>;
type KeyFn<S> = Box<dyn Fn(&Context<S>) -> Option<String> + Send + Sync>;

/// A `LockableProcedure` assembled from closures.
///
/// ```ignore
/// let create = LockableCommand::new("order.create", |ctx| { /* ... */ })
///     .locked_on(|ctx, _principal| Some(vec![ctx.raw_input()["order_id"].clone().into()]))
///     .idempotent_by(|ctx| ctx.raw_input()["request_id"].as_str().map(str::to_string));
/// ```
pub struct LockableCommand<S> {
    name: String,
    handle: HandleFn<S>,
    resources: Option<ResourcesFn<S>>,
    idempotency_key: Option<KeyFn<S>>,
    fallback_retry: bool,
}

impl<S: 'static> LockableCommand<S> {
    /// A command with the default lock policy and no idempotent replay.
    pub fn new<F>(name: impl Into<String>, handle: F) -> Self
    where
        F: Fn(&Context<S>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            handle: Box::new(handle),
            resources: None,
            idempotency_key: None,
            fallback_retry: false,
        }
    }

    /// Choose the lock resources per request.
    pub fn locked_on<F>(mut self, resources: F) -> Self
    where
        F: Fn(&Context<S>, Option<&str>) -> Option<Vec<LockResource>> + Send + Sync + 'static,
    {
        self.resources = Some(Box::new(resources));
        self
    }

    /// Never lock; the handler runs directly.
    pub fn without_lock(self) -> Self {
        self.locked_on(|_, _| None)
    }

    /// Replay results to requests that map to the same key.
    pub fn idempotent_by<F>(mut self, key: F) -> Self
    where
        F: Fn(&Context<S>) -> Option<String> + Send + Sync + 'static,
    {
        self.idempotency_key = Some(Box::new(key));
        self
    }

    /// Retry once without the lock after an unexpected failure.
    pub fn with_fallback_retry(mut self, enabled: bool) -> Self {
        self.fallback_retry = enabled;
        self
    }
}

impl<S: 'static> LockableProcedure<S> for LockableCommand<S> {
    fn execute(&self, ctx: &Context<S>) -> Result<Value, HandlerError> {
        (self.handle)(ctx)
    }

    fn procedure_name(&self) -> String {
        canonical_name(&self.name)
    }

    fn lock_resources(&self, ctx: &Context<S>, principal: Option<&str>) -> Option<Vec<LockResource>> {
        match &self.resources {
            Some(resources) => resources(ctx, principal),
            None => Some(vec![principal
                .map(LockResource::from)
                .unwrap_or_else(|| self.procedure_name().into())]),
        }
    }

    fn idempotency_key(&self, ctx: &Context<S>) -> Option<String> {
        self.idempotency_key.as_ref().and_then(|key| key(ctx))
    }

    fn fallback_retry(&self) -> bool {
        self.fallback_retry
    }
}
