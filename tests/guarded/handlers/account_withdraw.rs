//! Handler: account.withdraw
//!
//! Lockable procedure assembled from closures.

use guarded_rust::microsvc::{Context, HandlerError};
use guarded_rust::procedure::LockableCommand;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::support::Bank;

pub const COMMAND: &str = "account.withdraw";

#[derive(Deserialize)]
pub struct Input {
    pub account: String,
    pub amount: i64,
}

pub fn guard(ctx: &Context<Bank>) -> bool {
    ctx.has_fields(&["account", "amount"])
}

pub fn handle(ctx: &Context<Bank>) -> Result<Value, HandlerError> {
    let input = ctx.input::<Input>()?;
    let balance = ctx.state().apply(&input.account, -input.amount)?;
    Ok(json!({ "account": input.account, "balance": balance }))
}

pub fn procedure() -> LockableCommand<Bank> {
    LockableCommand::new(COMMAND, handle)
        .locked_on(|ctx, _| Some(vec![ctx.raw_input()["account"].clone().into()]))
        .idempotent_by(|ctx| {
            ctx.raw_input()["request_id"]
                .as_str()
                .map(|id| format!("{COMMAND}:{id}"))
        })
}
