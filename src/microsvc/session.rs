//! Session variables from the request context (e.g., Hasura session variables).

use std::collections::HashMap;

/// Session variable carrying the authenticated user id.
pub const USER_ID: &str = "x-hasura-user-id";

/// Session variable carrying the user role.
pub const ROLE: &str = "x-hasura-role";

/// Parsed session variables from the incoming request.
///
/// Transports fill these from whatever identity source they have: JWT claims
/// forwarded by Hasura, HTTP headers, bus message metadata.
///
/// ```json
/// {
///   "x-hasura-user-id": "user-42",
///   "x-hasura-role": "customer"
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Session {
    variables: HashMap<String, String>,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session from a map of variables.
    pub fn from_map(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }

    /// Create a session for an authenticated user.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.set(USER_ID, user_id);
        session
    }

    /// Get the user ID (`x-hasura-user-id`).
    pub fn user_id(&self) -> Option<&str> {
        self.get(USER_ID)
    }

    /// Get the user role (`x-hasura-role`).
    pub fn role(&self) -> Option<&str> {
        self.get(ROLE)
    }

    /// Get a session variable by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|v| v.as_str())
    }

    /// Set a session variable.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Check if a session variable exists.
    pub fn has(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    /// Get all session variables.
    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }
}
