//! Guarded procedure integration tests.

mod idempotency;
mod conflict;
mod principal;
