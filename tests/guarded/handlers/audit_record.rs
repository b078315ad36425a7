//! Handler: audit.record
//!
//! Keeps the default lock policy: the caller, or the procedure itself for
//! anonymous requests.

use guarded_rust::microsvc::{Context, HandlerError};
use guarded_rust::procedure::LockableProcedure;
use serde_json::{json, Value};

use crate::support::Bank;

pub const COMMAND: &str = "audit.record";

pub fn guard(ctx: &Context<Bank>) -> bool {
    ctx.has_field("entry")
}

pub struct AuditRecord;

impl LockableProcedure<Bank> for AuditRecord {
    fn execute(&self, ctx: &Context<Bank>) -> Result<Value, HandlerError> {
        let entry = ctx.raw_input()["entry"].as_str().unwrap_or_default().to_string();
        ctx.state().record(entry.clone());
        Ok(json!({ "recorded": entry }))
    }
}

pub fn procedure() -> AuditRecord {
    AuditRecord
}
