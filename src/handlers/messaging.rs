//! Messaging handlers: MESG (direct) and BCST (broadcast).

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::proto::Request;
use async_trait::async_trait;
use tracing::debug;

/// Handler for MESG: deliver free text to one named peer.
pub struct MesgHandler;

#[async_trait]
impl Handler for MesgHandler {
    async fn handle(&self, ctx: &mut Context<'_>, req: &Request<'_>) -> HandlerResult {
        if req.args.len() < 2 {
            return Err(HandlerError::NeedMoreParams { command: "mesg" });
        }

        let target = req.args[0];
        let text = req.trailing(1);
        let sender = ctx.name()?.to_string();

        let peer = ctx
            .roster
            .lookup(target)
            .ok_or_else(|| HandlerError::NoSuchUser(target.to_string()))?;

        debug!(from = %sender, to = %target, "Direct message");

        if !ctx.roster.direct(&peer, &format!("[Direct] '{sender}': {text}")) {
            // Target died between lookup and delivery; it has been evicted.
            return Err(HandlerError::NoSuchUser(target.to_string()));
        }
        Ok(())
    }
}

/// Handler for BCST: broadcast free text to everyone, tagged with the
/// sender's name. The sender receives its own echo, matching the everyone-
/// in-the-room delivery of the broadcaster.
pub struct BcstHandler;

#[async_trait]
impl Handler for BcstHandler {
    async fn handle(&self, ctx: &mut Context<'_>, req: &Request<'_>) -> HandlerResult {
        let text = req.trailing(0);
        if text.is_empty() {
            return Err(HandlerError::NoTextToSend { command: "bcst" });
        }

        let sender = ctx.name()?;
        debug!(from = %sender, "Broadcast message");
        ctx.roster.broadcast(&format!("[Chat] {sender}: {text}"), false);
        Ok(())
    }
}
