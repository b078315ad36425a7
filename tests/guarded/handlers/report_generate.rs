//! Handler: report.generate
//!
//! Fails with an infrastructure error a configurable number of times and
//! opts into the unguarded retry.

use std::sync::atomic::{AtomicUsize, Ordering};

use guarded_rust::microsvc::{Context, HandlerError};
use guarded_rust::procedure::LockableProcedure;
use serde_json::{json, Value};

use crate::support::Bank;

pub const COMMAND: &str = "report.generate";

pub fn guard(_ctx: &Context<Bank>) -> bool {
    true
}

pub struct GenerateReport {
    failures_left: AtomicUsize,
}

impl GenerateReport {
    pub fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
        }
    }
}

impl LockableProcedure<Bank> for GenerateReport {
    fn execute(&self, ctx: &Context<Bank>) -> Result<Value, HandlerError> {
        ctx.state().record("report");
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(HandlerError::other(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "report store timed out",
            )));
        }
        Ok(json!({ "report": "ready" }))
    }

    fn fallback_retry(&self) -> bool {
        true
    }
}

/// Registered instance fails once.
pub fn procedure() -> GenerateReport {
    GenerateReport::failing(1)
}
