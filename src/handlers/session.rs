//! Session handlers: JOIN and QUIT.

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::proto::Request;
use async_trait::async_trait;
use tracing::info;

/// Validates a display name.
///
/// Names are case-sensitive and limited to 1-30 ASCII letters, digits,
/// underscores, and hyphens; whitespace cannot occur since names are single
/// tokens.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 30
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Handler for JOIN: registers a display name and transitions the session
/// from Anonymous to Named.
pub struct JoinHandler;

#[async_trait]
impl Handler for JoinHandler {
    async fn handle(&self, ctx: &mut Context<'_>, req: &Request<'_>) -> HandlerResult {
        if ctx.state.is_named() {
            return Err(HandlerError::AlreadyRegistered);
        }

        let name = req
            .args
            .first()
            .copied()
            .ok_or(HandlerError::NeedMoreParams { command: "join" })?;

        if !is_valid_name(name) {
            return Err(HandlerError::ErroneousName(name.to_string()));
        }

        ctx.roster
            .register_name(ctx.peer, name)
            .map_err(|_| HandlerError::NameInUse(name.to_string()))?;
        ctx.state.name = Some(name.to_string());

        info!(name = %name, addr = %ctx.peer.addr, "Client registered");

        ctx.roster.broadcast(
            &format!("'{name}' has joined the chatroom! ({})", ctx.peer.addr),
            true,
        );
        ctx.reply("Type 'help' for a list of commands.")
    }
}

/// Handler for QUIT: announces the departure and ends the session.
pub struct QuitHandler;

#[async_trait]
impl Handler for QuitHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _req: &Request<'_>) -> HandlerResult {
        match ctx.state.name.as_deref() {
            Some(name) => ctx
                .roster
                .broadcast(&format!("'{name}' has left the chatroom!"), true),
            None => ctx
                .roster
                .broadcast(&format!("{} has stopped connecting.", ctx.peer.addr), true),
        }
        Err(HandlerError::Quit)
    }
}
