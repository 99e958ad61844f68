//! Command handlers.
//!
//! This module contains the Handler trait and command registry for
//! dispatching parsed lines to the right handler. The registry gates every
//! command except `join` and `quit` behind registration: an anonymous
//! connection is told to pick a name first.

mod messaging;
mod query;
mod session;

pub use messaging::{BcstHandler, MesgHandler};
pub use query::{HelpHandler, ListHandler};
pub use session::{JoinHandler, QuitHandler, is_valid_name};

use crate::error::{HandlerError, HandlerResult};
use crate::proto::Request;
use crate::state::{Peer, Roster, SessionState};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// The issuing connection's roster entry.
    pub peer: &'a Arc<Peer>,
    /// Shared directory of live peers.
    pub roster: &'a Arc<Roster>,
    /// Registration state of the issuing connection.
    pub state: &'a mut SessionState,
}

impl Context<'_> {
    /// Queue a reply line to the issuing client.
    ///
    /// Delivery is non-blocking: the queue is drained by the same connection
    /// task that runs the handler, so waiting on a full queue here would
    /// deadlock the session. A full or closed queue fails the dispatch and
    /// ends the session instead.
    pub fn reply(&self, line: impl Into<String>) -> HandlerResult {
        let line = line.into();
        if self.peer.try_send(&line) {
            Ok(())
        } else {
            Err(HandlerError::Send(mpsc::error::SendError(line)))
        }
    }

    /// The issuing connection's display name. Dispatch gating guarantees
    /// this is present in every named-state handler.
    pub fn name(&self) -> Result<&str, HandlerError> {
        self.state.name.as_deref().ok_or(HandlerError::NotRegistered)
    }
}

/// Trait implemented by all command handlers.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle a parsed command line.
    async fn handle(&self, ctx: &mut Context<'_>, req: &Request<'_>) -> HandlerResult;
}

/// Registry of command handlers, keyed by lower-cased command name.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        handlers.insert("join", Box::new(JoinHandler));
        handlers.insert("quit", Box::new(QuitHandler));
        handlers.insert("help", Box::new(HelpHandler));
        handlers.insert("list", Box::new(ListHandler));
        handlers.insert("mesg", Box::new(MesgHandler));
        handlers.insert("bcst", Box::new(BcstHandler));

        Self { handlers }
    }

    /// Dispatch a parsed line against the session's registration state.
    pub async fn dispatch(&self, ctx: &mut Context<'_>, req: &Request<'_>) -> HandlerResult {
        // Registration is the protocol's only admission control: anonymous
        // connections may only JOIN or QUIT.
        if !ctx.state.is_named() && !matches!(req.command.as_str(), "join" | "quit") {
            return Err(HandlerError::NotRegistered);
        }

        match self.handlers.get(req.command.as_str()) {
            Some(handler) => handler.handle(ctx, req).await,
            None => Err(HandlerError::UnknownCommand(req.command.clone())),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
