//! Guard configuration.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Message shown to callers when their request's lock is unavailable.
pub const DEFAULT_TRY_AGAIN_MESSAGE: &str = "Too many requests, please try again shortly.";

/// Default lifetime of a cached idempotent result, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Overrides `conflict_message`.
pub const CONFLICT_MESSAGE_ENV: &str = "GUARDED_LOCK_CONFLICT_MESSAGE";

/// Overrides `acquire_failure_message`.
pub const ACQUIRE_FAILURE_MESSAGE_ENV: &str = "GUARDED_LOCK_ACQUIRE_MESSAGE";

/// Overrides `cache_ttl_secs`.
pub const CACHE_TTL_ENV: &str = "GUARDED_IDEMPOTENCY_TTL_SECS";

/// Settings for a `Guard`, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Caller-facing message when another request holds the lock.
    pub conflict_message: String,
    /// Caller-facing message when the lock backend fails.
    pub acquire_failure_message: String,
    /// Lifetime of cached idempotent results.
    pub cache_ttl_secs: u64,
    /// Fail the request when its result cannot be cached.
    ///
    /// Off by default: the procedure already ran and its result is returned,
    /// only replay for duplicates is lost.
    pub propagate_cache_write_errors: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            conflict_message: DEFAULT_TRY_AGAIN_MESSAGE.to_string(),
            acquire_failure_message: DEFAULT_TRY_AGAIN_MESSAGE.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            propagate_cache_write_errors: false,
        }
    }
}

impl GuardConfig {
    /// Defaults, overridden by the `GUARDED_*` environment variables that are set.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key/value source. Blank values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(message) = lookup(CONFLICT_MESSAGE_ENV) {
            self.conflict_message = message;
        }
        if let Some(message) = lookup(ACQUIRE_FAILURE_MESSAGE_ENV) {
            self.acquire_failure_message = message;
        }
        if let Some(raw) = lookup(CACHE_TTL_ENV) {
            match raw.trim().parse() {
                Ok(secs) => self.cache_ttl_secs = secs,
                Err(_) => tracing::warn!(key = CACHE_TTL_ENV, value = %raw, "ignoring invalid cache ttl"),
            }
        }
        self
    }

    /// `cache_ttl_secs` as a `Duration`.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
