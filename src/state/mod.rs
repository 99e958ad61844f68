//! Shared server state.

mod roster;

pub use roster::{Peer, Roster, RosterError};

/// Per-connection registration state.
///
/// A connection starts Anonymous (`name` is `None`) and becomes Named
/// exactly once via a successful `JOIN`.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Display name, set on successful registration.
    pub name: Option<String>,
}

impl SessionState {
    /// Whether the connection has registered a display name.
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }
}
