//! Lockable procedures: command handlers that run under named locks and
//! replay their results to duplicate requests.

pub mod cache;
pub mod lock;
pub mod logger;
pub mod microsvc;
pub mod procedure;

pub use cache::{CacheError, CacheStore, InMemoryCache};
pub use lock::{
    InMemoryLockManager, LockError, LockHandle, LockService, LockServiceExt, ManagedLockService,
};
pub use microsvc::{Context, HandlerError, Service, Session};
pub use procedure::{
    Guard, GuardConfig, LockEntity, LockResource, LockableCommand, LockableProcedure,
    PrincipalResolver, SessionPrincipal,
};
