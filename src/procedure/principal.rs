//! Identity lookup for the default lock resource policy.

use crate::microsvc::Session;

/// Resolves the identity a request runs as.
///
/// The default lock policy locks per principal when there is one, so two
/// requests from the same user serialize while different users run in
/// parallel.
pub trait PrincipalResolver: Send + Sync {
    /// The current principal's identifier, if the request is authenticated.
    fn current_principal(&self, session: &Session) -> Option<String>;
}

/// Reads the user id session variable. Blank ids count as anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionPrincipal;

impl PrincipalResolver for SessionPrincipal {
    fn current_principal(&self, session: &Session) -> Option<String> {
        session
            .user_id()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

/// Treats every request as anonymous, so the default policy locks per procedure.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousPrincipal;

impl PrincipalResolver for AnonymousPrincipal {
    fn current_principal(&self, _session: &Session) -> Option<String> {
        None
    }
}
