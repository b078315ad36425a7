//! microsvc — Convention-based microservice command handler framework.
//!
//! Build microservices by registering command handlers on a `Service`.
//! Each handler receives a `Context<S>` with access to the input payload,
//! session variables, and the shared state. Handlers that must not run
//! concurrently are registered as lockable procedures.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use guarded_rust::microsvc;
//! use guarded_rust::procedure::LockableCommand;
//! use serde_json::json;
//!
//! let service = Arc::new(
//!     microsvc::Service::new(())
//!         .command("ping", |_ctx| Ok(json!({ "pong": true })))
//!         .procedure("order.create", LockableCommand::new("order.create", |ctx| {
//!             let input = ctx.input::<CreateOrderInput>()?;
//!             Ok(json!({ "id": input.id }))
//!         }))
//! );
//!
//! // Direct dispatch
//! let result = service.dispatch("order.create", json!({ "id": "o1" }), microsvc::Session::new());
//!
//! // HTTP transport (requires "http" feature)
//! // microsvc::serve(service, "0.0.0.0:3000").await?;
//! ```
//!
//! ## Handler Convention
//!
//! Each handler file follows this convention:
//!
//! ```ignore
//! // src/handlers/order_create.rs
//!
//! pub const COMMAND: &str = "order.create";
//!
//! pub fn guard<S>(ctx: &microsvc::Context<S>) -> bool {
//!     ctx.has_fields(&["id", "product_id"])
//! }
//!
//! pub fn handle<S>(ctx: &microsvc::Context<S>) -> Result<Value, microsvc::HandlerError> {
//!     let input = ctx.input::<CreateOrderInput>()?;
//!     Ok(json!({ "id": input.id }))
//! }
//! ```
//!
//! Lockable handler files export `procedure()` instead of `handle`:
//!
//! ```ignore
//! pub fn procedure() -> CreateOrder {
//!     CreateOrder
//! }
//! ```

mod context;
mod error;
mod service;
mod session;

pub use context::Context;
pub use error::HandlerError;
pub use service::{CommandRequest, CommandResponse, Service};
pub use session::Session;

// HTTP transport (requires "http" feature)
#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::{router, serve};

/// Register handler modules with a service using the convention pattern.
///
/// Each handler module must export:
/// - `COMMAND: &str` — the command name
/// - `guard(ctx) -> bool` — input validation
/// - `handle(ctx) -> Result<Value, HandlerError>` — the handler
///
/// # Example
/// ```ignore
/// let service = guarded_rust::register_handlers!(
///     microsvc::Service::new(()),
///     handlers::ping,
///     handlers::whoami,
/// );
/// ```
#[macro_export]
macro_rules! register_handlers {
    ($service:expr, $( $($seg:ident)::+ ),+ $(,)?) => {
        $service
        $(
            .command_guarded(
                $($seg)::+::COMMAND,
                $($seg)::+::guard,
                $($seg)::+::handle,
            )
        )+
    };
}

/// Register lockable handler modules with a service.
///
/// Each handler module must export:
/// - `COMMAND: &str` — the command name
/// - `guard(ctx) -> bool` — input validation, run before locking
/// - `procedure()` — a value implementing `LockableProcedure`
///
/// # Example
/// ```ignore
/// let service = guarded_rust::register_procedures!(
///     microsvc::Service::new(()).with_guard(guard),
///     handlers::order_create,
///     handlers::order_pay,
/// );
/// ```
#[macro_export]
macro_rules! register_procedures {
    ($service:expr, $( $($seg:ident)::+ ),+ $(,)?) => {
        $service
        $(
            .procedure_guarded(
                $($seg)::+::COMMAND,
                $($seg)::+::guard,
                $($seg)::+::procedure(),
            )
        )+
    };
}
