//! chatterd - a small multi-client chatroom daemon.
//!
//! Clients connect over TCP, register a display name with `JOIN <name>`,
//! and exchange broadcast (`BCST`) and direct (`MESG`) messages through a
//! line-based, case-insensitive command protocol.

pub mod config;
pub mod error;
pub mod handlers;
pub mod network;
pub mod proto;
pub mod state;
