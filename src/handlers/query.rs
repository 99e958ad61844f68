//! Query handlers: HELP and LIST.

use super::{Context, Handler};
use crate::error::HandlerResult;
use crate::proto::Request;
use async_trait::async_trait;

/// Static command list sent in response to HELP.
const HELP_LINES: &[&str] = &[
    "HELP - Lists all available commands.",
    "LIST - Lists everyone in the chatroom.",
    "MESG <username> <message> - Messages any valid <username> with the <message>.",
    "BCST <message> - Broadcasts a message to everyone in the chatroom.",
    "QUIT - Closes the connection to the chatroom.",
];

/// Handler for HELP.
pub struct HelpHandler;

#[async_trait]
impl Handler for HelpHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _req: &Request<'_>) -> HandlerResult {
        for line in HELP_LINES {
            ctx.reply(*line)?;
        }
        Ok(())
    }
}

/// Handler for LIST: the current set of registered display names.
pub struct ListHandler;

#[async_trait]
impl Handler for ListHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _req: &Request<'_>) -> HandlerResult {
        let names = ctx.roster.names();
        ctx.reply(format!("Users: {}", names.join(", ")))
    }
}
