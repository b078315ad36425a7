//! Error types for microsvc command handlers.

use std::error::Error;

use thiserror::Error;

use crate::cache::CacheError;
use crate::lock::LockError;

/// Error type for command handler operations.
///
/// Variants below status 500 are caller-facing: they already carry a message
/// that is safe to show and the guard passes them through untouched.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// No handler registered for this command name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// Payload decode / deserialization failed.
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    /// Business logic rejected the command (validation, invariant violation).
    #[error("rejected: {0}")]
    Rejected(String),
    /// Aggregate or resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Missing or invalid authentication / authorization.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Guard rejected the command (input validation failed).
    #[error("guard rejected command: {0}")]
    GuardRejected(String),
    /// The command's lock could not be taken; the caller should retry shortly.
    #[error("{message}")]
    TryAgain {
        message: String,
        #[source]
        source: LockError,
    },
    /// Lock error raised outside acquisition (expiry, release).
    #[error("lock error: {0}")]
    Lock(#[from] LockError),
    /// Idempotency cache error.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    /// Other error.
    #[error("handler error: {0}")]
    Other(#[source] Box<dyn Error + Send + Sync>),
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::DecodeFailed(err.to_string())
    }
}

impl HandlerError {
    /// A retryable, caller-facing error wrapping the lock failure that caused it.
    pub fn try_again(message: impl Into<String>, source: LockError) -> Self {
        HandlerError::TryAgain {
            message: message.into(),
            source,
        }
    }

    /// Wrap any error as `Other`.
    pub fn other<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        HandlerError::Other(Box::new(err))
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::UnknownCommand(_) => 404,
            HandlerError::DecodeFailed(_) => 400,
            HandlerError::Rejected(_) => 422,
            HandlerError::NotFound(_) => 404,
            HandlerError::Unauthorized(_) => 401,
            HandlerError::GuardRejected(_) => 400,
            HandlerError::TryAgain { .. } => 429,
            HandlerError::Lock(_) => 500,
            HandlerError::Cache(_) => 500,
            HandlerError::Other(_) => 500,
        }
    }

    /// Whether the error is already fit to show the caller.
    pub fn is_friendly(&self) -> bool {
        self.status_code() < 500
    }
}
