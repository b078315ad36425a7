//! Context passed to command handlers.
//!
//! Carries the parsed input, session variables, and a reference to the
//! service state. Handlers access everything they need through the context.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::HandlerError;
use super::session::Session;

/// The context passed to every command handler and lockable procedure.
///
/// Generic over `S` (the shared service state) so handlers can reach
/// whatever repositories or clients the service was built with.
///
/// ## Example
///
/// ```ignore
/// pub fn handle(ctx: &Context<AppState>) -> Result<Value, HandlerError> {
///     let user_id = ctx.user_id()?;
///     let input = ctx.input::<CreateOrderInput>()?;
///     // ...
/// }
/// ```
pub struct Context<'a, S> {
    command_name: String,
    input: Value,
    session: Session,
    state: &'a S,
}

impl<'a, S> Context<'a, S> {
    /// Create a new context.
    pub fn new(command_name: impl Into<String>, input: Value, session: Session, state: &'a S) -> Self {
        Self {
            command_name: command_name.into(),
            input,
            session,
            state,
        }
    }

    /// Deserialize the input payload into a typed struct.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(self.input.clone()).map_err(|e| HandlerError::DecodeFailed(e.to_string()))
    }

    /// Get the raw JSON input.
    pub fn raw_input(&self) -> &Value {
        &self.input
    }

    /// Whether the request carried a parameter bag at all.
    pub fn has_params(&self) -> bool {
        !self.input.is_null()
    }

    /// Get the command name.
    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    /// Get the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get the user ID from the session. Returns `Unauthorized` if not present.
    pub fn user_id(&self) -> Result<&str, HandlerError> {
        self.session
            .user_id()
            .ok_or_else(|| HandlerError::Unauthorized("missing user ID in session".into()))
    }

    /// Get the user role from the session.
    pub fn role(&self) -> Option<&str> {
        self.session.role()
    }

    /// Get a reference to the service state.
    pub fn state(&self) -> &S {
        self.state
    }

    /// Check if the raw input contains a field.
    pub fn has_field(&self, field: &str) -> bool {
        self.input.get(field).is_some()
    }

    /// Check if the raw input contains all specified fields.
    pub fn has_fields(&self, fields: &[&str]) -> bool {
        fields.iter().all(|f| self.has_field(f))
    }
}
