use serde_json::Value;

use super::resource::{canonical_name, LockResource};
use crate::microsvc::{Context, HandlerError};

/// A command handler that runs under its own lock resources.
///
/// Only `execute` is required. The other methods are the per-procedure
/// policy the `Guard` consults; override them to change what is locked,
/// whether results replay, and whether failures retry unguarded.
pub trait LockableProcedure<S>: Send + Sync {
    /// The handler body.
    fn execute(&self, ctx: &Context<S>) -> Result<Value, HandlerError>;

    /// Stable name of the procedure, derived from its type path.
    fn procedure_name(&self) -> String {
        canonical_name(std::any::type_name::<Self>())
    }

    /// What to lock for this request.
    ///
    /// Defaults to the principal when the request is authenticated, else the
    /// procedure name. Return `None` to skip locking and idempotency entirely.
    /// Do not derive resources from request parameters unless the lock must
    /// really be that fine-grained.
    fn lock_resources(&self, _ctx: &Context<S>, principal: Option<&str>) -> Option<Vec<LockResource>> {
        let resource = match principal {
            Some(principal) => LockResource::from(principal),
            None => LockResource::from(self.procedure_name()),
        };
        Some(vec![resource])
    }

    /// Cache key under which the result is replayed to duplicates.
    /// `None` disables idempotent replay.
    fn idempotency_key(&self, _ctx: &Context<S>) -> Option<String> {
        None
    }

    /// Retry once without the lock after an unexpected failure.
    fn fallback_retry(&self) -> bool {
        false
    }
}
