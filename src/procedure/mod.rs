//! Lockable procedures.
//!
//! A `LockableProcedure` is a command handler that declares what it locks,
//! whether duplicate requests replay its result, and whether it may retry
//! without the lock. The `Guard` applies that policy around each call.
//!
//! ```ignore
//! use guarded_rust::procedure::{Guard, LockableCommand};
//!
//! let guard = Guard::in_memory();
//! let pay = LockableCommand::new("order.pay", |ctx| { /* ... */ })
//!     .locked_on(|ctx, _| Some(vec![ctx.raw_input()["order_id"].clone().into()]))
//!     .idempotent_by(|ctx| ctx.raw_input()["request_id"].as_str().map(str::to_string));
//!
//! let result = guard.invoke(&pay, &ctx)?;
//! ```

mod command;
mod config;
mod guard;
mod principal;
mod procedure;
mod resource;

pub use command::LockableCommand;
pub use config::{
    GuardConfig, ACQUIRE_FAILURE_MESSAGE_ENV, CACHE_TTL_ENV, CONFLICT_MESSAGE_ENV,
    DEFAULT_CACHE_TTL_SECS, DEFAULT_TRY_AGAIN_MESSAGE,
};
pub use guard::Guard;
pub use principal::{AnonymousPrincipal, PrincipalResolver, SessionPrincipal};
pub use procedure::LockableProcedure;
pub use resource::{canonical_name, filter_resources, LockEntity, LockResource};
