//! Connection - handles an individual client session.
//!
//! Each connection runs in its own Tokio task: a unified `tokio::select!`
//! loop over framed line reads, the peer's outbound queue, and the eviction
//! token. Whatever path exits the loop, the peer is removed from the roster
//! and the transport closed exactly once.

use crate::error::{HandlerError, NAME_REQUIRED};
use crate::handlers::{Context, Registry};
use crate::proto::Request;
use crate::state::{Peer, Roster, SessionState};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, instrument, warn};

/// Why the session loop exited.
#[derive(Debug)]
enum Disconnect {
    /// Client issued QUIT; the departure notice is already broadcast.
    Quit,
    /// Client closed its end of the stream.
    PeerClosed,
    /// Transport read or write failure.
    Error,
    /// Evicted from the roster by a failed delivery elsewhere.
    Evicted,
}

/// A client connection handler.
pub struct Connection {
    peer: Arc<Peer>,
    outgoing: mpsc::Receiver<String>,
    stream: TcpStream,
    roster: Arc<Roster>,
    registry: Arc<Registry>,
    max_line_length: usize,
}

impl Connection {
    /// Create a new connection handler around an accepted stream.
    pub fn new(
        peer: Arc<Peer>,
        outgoing: mpsc::Receiver<String>,
        stream: TcpStream,
        roster: Arc<Roster>,
        registry: Arc<Registry>,
        max_line_length: usize,
    ) -> Self {
        Self {
            peer,
            outgoing,
            stream,
            roster,
            registry,
            max_line_length,
        }
    }

    /// Run the session loop until the client leaves, then clean up.
    #[instrument(skip(self), fields(addr = %self.peer.addr), name = "connection")]
    pub async fn run(self) -> anyhow::Result<()> {
        let Connection {
            peer,
            mut outgoing,
            stream,
            roster,
            registry,
            max_line_length,
        } = self;
        let addr = peer.addr;

        let mut framed = Framed::new(
            stream,
            LinesCodec::new_with_max_length(max_line_length),
        );
        let mut state = SessionState::default();

        // Connect-time banner; a failed write means the peer is already gone.
        let mut reason = Disconnect::Error;
        let mut healthy = true;
        for line in [
            "Welcome to the chatroom!",
            "------------------------",
            NAME_REQUIRED,
        ] {
            if framed.send(line).await.is_err() {
                healthy = false;
                break;
            }
        }

        if healthy {
            reason = loop {
                tokio::select! {
                    inbound = framed.next() => match inbound {
                        Some(Ok(line)) => {
                            let Some(req) = Request::parse(&line) else { continue };
                            let mut ctx = Context {
                                peer: &peer,
                                roster: &roster,
                                state: &mut state,
                            };
                            match registry.dispatch(&mut ctx, &req).await {
                                Ok(()) => {}
                                Err(HandlerError::Quit) => {
                                    info!("Client quit");
                                    break Disconnect::Quit;
                                }
                                Err(HandlerError::Send(_)) => break Disconnect::Error,
                                Err(e) => {
                                    debug!(command = %req.command, error = %e, "Handler error");
                                    if let Some(reply) = e.to_reply()
                                        && !peer.try_send(&reply)
                                    {
                                        break Disconnect::Error;
                                    }
                                }
                            }
                        }
                        // Recoverable: the codec discards the rest of the
                        // oversize line and resumes at the next delimiter.
                        Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                            warn!("Input line too long");
                            if !peer.try_send("Input line too long.") {
                                break Disconnect::Error;
                            }
                        }
                        Some(Err(LinesCodecError::Io(e))) => {
                            debug!(error = %e, "Read error");
                            break Disconnect::Error;
                        }
                        None => {
                            info!("Client closed connection");
                            break Disconnect::PeerClosed;
                        }
                    },
                    queued = outgoing.recv() => match queued {
                        Some(line) => {
                            if framed.send(line).await.is_err() {
                                break Disconnect::Error;
                            }
                        }
                        None => break Disconnect::Error,
                    },
                    _ = peer.cancelled() => {
                        info!("Connection evicted");
                        break Disconnect::Evicted;
                    }
                }
            };
        }

        // Best-effort flush of anything still queued (e.g. the quitter's own
        // departure notice) before the transport drops.
        if !matches!(reason, Disconnect::Error) {
            while let Ok(line) = outgoing.try_recv() {
                if framed.send(line).await.is_err() {
                    break;
                }
            }
        }

        // Exactly-once cleanup: remove() returns None when the eviction path
        // already took this peer out, so nothing is announced twice.
        // Eviction already removed the peer from the roster, so the
        // departure notice cannot key off `remove` succeeding there.
        let removed = roster.remove(addr);
        let announce = match reason {
            Disconnect::PeerClosed | Disconnect::Error => removed.is_some(),
            Disconnect::Evicted => true,
            Disconnect::Quit => false,
        };
        if announce && let Some(name) = &state.name {
            roster.broadcast(&format!("'{name}' has left the chatroom!"), true);
        }

        info!(reason = ?reason, clients = roster.len(), "Connection closed");
        Ok(())
    }
}
