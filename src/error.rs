//! Unified error handling for chatterd.
//!
//! Per-connection failures stay inside the owning connection task; the only
//! error visible at process scope is a failure to bind the listen endpoint.

use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::mpsc;

/// Reply sent to clients that issue a command before registering a name.
pub const NAME_REQUIRED: &str =
    "YOU DO NOT HAVE A NAME! Please use the command 'JOIN <username>' before continuing.";

/// The listener could not open its endpoint. Fatal at startup.
#[derive(Debug, Error)]
#[error("failed to bind {addr}")]
pub struct BindError {
    pub addr: SocketAddr,
    #[source]
    pub source: std::io::Error,
}

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("not enough parameters for {command}")]
    NeedMoreParams { command: &'static str },

    #[error("no text to send")]
    NoTextToSend { command: &'static str },

    #[error("name in use: {0}")]
    NameInUse(String),

    #[error("erroneous name: {0}")]
    ErroneousName(String),

    #[error("not registered")]
    NotRegistered,

    #[error("already registered")]
    AlreadyRegistered,

    #[error("no such user: {0}")]
    NoSuchUser(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("send error: {0}")]
    Send(#[from] mpsc::error::SendError<String>),

    /// Client quit; ends the session after cleanup.
    #[error("client quit")]
    Quit,
}

impl HandlerError {
    /// Convert to the text reply sent to the offending client.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply
    /// (send failures, quit).
    pub fn to_reply(&self) -> Option<String> {
        match self {
            Self::NeedMoreParams { command } | Self::NoTextToSend { command } => Some(format!(
                "Invalid usage of {}, please type 'help'.",
                command.to_uppercase()
            )),
            Self::NameInUse(_) => Some(
                "That name was already taken, please use another name and try again.".to_string(),
            ),
            Self::ErroneousName(name) => Some(format!(
                "'{name}' is not a valid name! Names are 1-30 letters, digits, '-' or '_'."
            )),
            Self::NotRegistered => Some(NAME_REQUIRED.to_string()),
            Self::AlreadyRegistered => {
                Some("You have already registered, you cannot use 'JOIN'.".to_string())
            }
            Self::NoSuchUser(_) => Some("Invalid name for MESG, please type 'list'.".to_string()),
            Self::UnknownCommand(cmd) => Some(format!(
                "'{cmd}' is not a command! Please use 'help' to find the list of commands."
            )),
            Self::Send(_) | Self::Quit => None,
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;
