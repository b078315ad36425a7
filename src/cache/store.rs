//! CacheStore - keyed result storage with per-entry expiry.

use std::time::Duration;

use serde_json::Value;

use super::CacheError;

/// Default lifetime of an idempotency entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Keyed storage for previously computed handler results.
///
/// Values are JSON so any backend (Redis, memcached, a SQL table) can hold
/// them. Expired entries must read as absent.
pub trait CacheStore: Send + Sync {
    /// Read a live entry. Returns `None` on miss or expiry.
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Write an entry that expires `ttl` after now, replacing any previous one.
    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;

    /// Remove an entry. Returns true if a live entry existed.
    fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Return the live entry, or run `compute` and store what it yields.
    ///
    /// A `None` from `compute` is returned as-is and nothing is stored.
    fn get_or_compute(
        &self,
        key: &str,
        ttl: Duration,
        compute: &dyn Fn() -> Result<Option<Value>, CacheError>,
    ) -> Result<Option<Value>, CacheError> {
        if let Some(hit) = self.get(key)? {
            return Ok(Some(hit));
        }
        let computed = compute()?;
        if let Some(value) = &computed {
            self.set(key, value.clone(), ttl)?;
        }
        Ok(computed)
    }
}

impl<T: CacheStore + ?Sized> CacheStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        (**self).delete(key)
    }
}
