use thiserror::Error;

/// Error type for cache store operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The in-process storage lock was poisoned.
    #[error("cache storage poisoned during {0}")]
    Poisoned(&'static str),
    /// The cache backend failed (connection refused, timeout, ...).
    #[error("cache backend error: {0}")]
    Backend(String),
    /// A value could not be encoded or decoded.
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
