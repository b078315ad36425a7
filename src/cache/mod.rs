//! Cache collaborator used for idempotent result replay.

mod error;
mod in_memory;
mod store;

pub use error::CacheError;
pub use in_memory::InMemoryCache;
pub use store::{CacheStore, DEFAULT_TTL};
