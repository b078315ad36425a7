//! Service — command handler registry and dispatch for microsvc.
//!
//! `Service<S>` holds shared state and a set of named command handlers.
//! Each handler receives a `Context<S>` and returns `Result<Value, HandlerError>`.
//! Lockable procedures are registered with `procedure` and run through the
//! service's `Guard`.
//!
//! ## Example
//!
//! ```ignore
//! use guarded_rust::microsvc::{Service, Session};
//! use guarded_rust::procedure::LockableCommand;
//! use serde_json::json;
//!
//! let service = Service::new(())
//!     .command("ping", |_ctx| Ok(json!({ "pong": true })))
//!     .procedure(
//!         "order.create",
//!         LockableCommand::new("order.create", |ctx| Ok(json!({ "id": ctx.raw_input()["id"] })))
//!             .idempotent_by(|ctx| ctx.raw_input()["request_id"].as_str().map(str::to_string)),
//!     );
//!
//! let result = service.dispatch("order.create", json!({ "id": "1", "request_id": "r1" }), Session::new());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::context::Context;
use super::error::HandlerError;
use super::session::Session;
use crate::procedure::{Guard, LockableProcedure};

type GuardFn<S> = Box<dyn Fn(&Context<S>) -> bool + Send + Sync>;
type HandleFn<S> = Box<dyn Fn(&Context<S>) -> Result<Value, HandlerError> + Send + Sync>;

/// A registered command handler with optional guard.
struct CommandHandler<S> {
    guard: Option<GuardFn<S>>,
    handle: HandleFn<S>,
}

/// A microservice that routes commands to handler functions.
///
/// Generic over `S`, the shared state handed to every handler through
/// `ctx.state()`.
pub struct Service<S> {
    state: S,
    handlers: HashMap<String, CommandHandler<S>>,
    guard: Option<Arc<Guard>>,
}

impl<S: Send + Sync + 'static> Service<S> {
    /// Create a new service with the given state.
    pub fn new(state: S) -> Self {
        Self {
            state,
            handlers: HashMap::new(),
            guard: None,
        }
    }

    /// Use `guard` for procedures registered after this call.
    ///
    /// Without it the first `procedure` registration installs
    /// `Guard::in_memory()`.
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    /// Register a command handler.
    ///
    /// Uses builder pattern — returns `self` for chaining.
    pub fn command<F>(self, name: &str, handler: F) -> Self
    where
        F: Fn(&Context<S>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.register(name, None, Box::new(handler))
    }

    /// Register a command handler with a guard function.
    ///
    /// The guard is called before the handler. If it returns `false`,
    /// the command is rejected with `HandlerError::GuardRejected`.
    pub fn command_guarded<G, F>(self, name: &str, guard: G, handler: F) -> Self
    where
        G: Fn(&Context<S>) -> bool + Send + Sync + 'static,
        F: Fn(&Context<S>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.register(name, Some(Box::new(guard)), Box::new(handler))
    }

    /// Register a lockable procedure. Each dispatch runs under its lock.
    pub fn procedure<P>(mut self, name: &str, procedure: P) -> Self
    where
        P: LockableProcedure<S> + 'static,
    {
        let handle = self.locked(procedure);
        self.register(name, None, handle)
    }

    /// Register a lockable procedure behind an input guard.
    ///
    /// The guard runs before any lock is taken.
    pub fn procedure_guarded<G, P>(mut self, name: &str, guard: G, procedure: P) -> Self
    where
        G: Fn(&Context<S>) -> bool + Send + Sync + 'static,
        P: LockableProcedure<S> + 'static,
    {
        let handle = self.locked(procedure);
        self.register(name, Some(Box::new(guard)), handle)
    }

    fn locked<P>(&mut self, procedure: P) -> HandleFn<S>
    where
        P: LockableProcedure<S> + 'static,
    {
        let guard = self
            .guard
            .get_or_insert_with(|| Arc::new(Guard::in_memory()))
            .clone();
        Box::new(move |ctx: &Context<S>| guard.invoke(&procedure, ctx))
    }

    fn register(mut self, name: &str, guard: Option<GuardFn<S>>, handle: HandleFn<S>) -> Self {
        self.handlers
            .insert(name.to_string(), CommandHandler { guard, handle });
        self
    }

    /// Dispatch a command by name.
    ///
    /// Builds a `Context` from the input and session, looks up the handler,
    /// runs the guard (if any), then calls the handler.
    pub fn dispatch(
        &self,
        command: &str,
        input: Value,
        session: Session,
    ) -> Result<Value, HandlerError> {
        let handler = self
            .handlers
            .get(command)
            .ok_or_else(|| HandlerError::UnknownCommand(command.to_string()))?;

        let ctx = Context::new(command, input, session, &self.state);

        if let Some(guard) = &handler.guard {
            if !guard(&ctx) {
                tracing::debug!(command, "guard rejected command");
                return Err(HandlerError::GuardRejected(command.to_string()));
            }
        }

        (handler.handle)(&ctx)
    }

    /// Dispatch a `CommandRequest`, returning a `CommandResponse`.
    pub fn dispatch_request(&self, request: &CommandRequest) -> CommandResponse {
        let session = Session::from_map(request.session_variables.clone());
        match self.dispatch(&request.command, request.input.clone(), session) {
            Ok(value) => CommandResponse {
                status: 200,
                body: value,
            },
            Err(e) => {
                let status = e.status_code();
                if status >= 500 {
                    tracing::error!(command = %request.command, error = %e, "command failed");
                }
                CommandResponse {
                    status,
                    body: serde_json::json!({ "error": e.to_string() }),
                }
            }
        }
    }

    /// List registered command names.
    pub fn commands(&self) -> Vec<&str> {
        self.handlers.keys().map(|s| s.as_str()).collect()
    }

    /// Get a reference to the shared state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// The guard shared by this service's procedures, once one exists.
    pub fn guard(&self) -> Option<&Guard> {
        self.guard.as_deref()
    }
}

// =============================================================================
// Request / Response types
// =============================================================================

/// An inbound command request.
///
/// Maps to a Hasura Action payload:
/// ```json
/// {
///   "action": { "name": "CreateOrder" },
///   "input": { "product_id": "SKU-1" },
///   "session_variables": { "x-hasura-user-id": "user-42" }
/// }
/// ```
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommandRequest {
    /// Command name (from `action.name` or URL path).
    pub command: String,
    /// JSON input payload.
    pub input: Value,
    /// Session variables (user ID, role, etc.).
    #[serde(default)]
    pub session_variables: HashMap<String, String>,
}

/// Response from dispatching a command.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommandResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Response body (handler result or error).
    pub body: Value,
}
