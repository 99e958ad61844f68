//! The Roster: shared directory of live peers.
//!
//! Two maps cover the same set of peers: `addr -> Peer` for every live
//! connection, and `name -> Peer` as a non-owning alias for registered ones.
//! The maps share one invariant (every name entry aliases an addr entry), so
//! one mutex guards both; every insert, lookup, and delete from any task goes
//! through it.
//!
//! Delivery is non-blocking: each peer owns a bounded outbound queue, and a
//! peer whose queue is full or closed is evicted instead of being allowed to
//! stall delivery to everyone else.

use crate::proto::SERVER_TAG;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, warn};

/// Roster operation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("chatroom is full")]
    Full,
    #[error("name '{0}' is already taken")]
    NameTaken(String),
}

/// One live connection as seen by the roster.
pub struct Peer {
    /// Remote address; unique among live peers.
    pub addr: SocketAddr,
    tx: mpsc::Sender<String>,
    name: Mutex<Option<String>>,
    cancel: CancellationToken,
}

impl Peer {
    /// Create a new anonymous peer around its outbound queue sender.
    pub fn new(addr: SocketAddr, tx: mpsc::Sender<String>) -> Arc<Self> {
        Arc::new(Self {
            addr,
            tx,
            name: Mutex::new(None),
            cancel: CancellationToken::new(),
        })
    }

    /// Display name, if registered.
    pub fn name(&self) -> Option<String> {
        self.name.lock().clone()
    }

    /// Queue a line without blocking. Returns `false` when the peer's queue
    /// is full or closed; the caller treats that as a failed delivery.
    /// All delivery goes through here: the queue is drained by the peer's
    /// own connection task, so nothing may ever wait on it.
    pub fn try_send(&self, line: &str) -> bool {
        self.tx.try_send(line.to_string()).is_ok()
    }

    /// Resolves once the peer has been evicted from the roster.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

#[derive(Default)]
struct Inner {
    clients: HashMap<SocketAddr, Arc<Peer>>,
    names: HashMap<String, Arc<Peer>>,
}

/// Shared directory of live peers, bounded by a connection capacity.
pub struct Roster {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl Roster {
    /// Create an empty roster with the given connection capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.inner.lock().clients.len()
    }

    /// Whether the roster holds no connections.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the roster is at capacity.
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Insert a newly accepted peer under its address.
    pub fn insert(&self, peer: Arc<Peer>) -> Result<(), RosterError> {
        let mut inner = self.inner.lock();
        if inner.clients.len() >= self.capacity {
            return Err(RosterError::Full);
        }
        inner.clients.insert(peer.addr, peer);
        Ok(())
    }

    /// Register a display name for a live peer. The conflict check and both
    /// map updates happen under one lock acquisition, so two clients racing
    /// on the same name cannot both win.
    pub fn register_name(&self, peer: &Arc<Peer>, name: &str) -> Result<(), RosterError> {
        let mut inner = self.inner.lock();
        if inner.names.contains_key(name) {
            return Err(RosterError::NameTaken(name.to_string()));
        }
        inner.names.insert(name.to_string(), Arc::clone(peer));
        *peer.name.lock() = Some(name.to_string());
        Ok(())
    }

    /// Look up a registered peer by display name.
    pub fn lookup(&self, name: &str) -> Option<Arc<Peer>> {
        self.inner.lock().names.get(name).cloned()
    }

    /// The current set of registered display names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().names.keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove a peer from both maps and signal its connection task to stop.
    ///
    /// Returns `None` if the peer was already gone, so that the cleanup and
    /// eviction paths cannot both announce the same departure.
    pub fn remove(&self, addr: SocketAddr) -> Option<Arc<Peer>> {
        let peer = {
            let mut inner = self.inner.lock();
            let peer = inner.clients.remove(&addr)?;
            if let Some(name) = peer.name.lock().as_deref() {
                inner.names.remove(name);
            }
            peer
        };
        peer.cancel.cancel();
        debug!(addr = %addr, name = ?peer.name(), "Peer removed from roster");
        Some(peer)
    }

    /// Stable snapshot of all live peers for iteration outside the lock.
    fn snapshot(&self) -> Vec<Arc<Peer>> {
        self.inner.lock().clients.values().cloned().collect()
    }

    /// Deliver a message to every live peer. Server-originated notices carry
    /// the system tag. A peer that fails to accept delivery is evicted and
    /// the broadcast continues for the remaining recipients.
    pub fn broadcast(&self, text: &str, system: bool) {
        let line = if system {
            format!("{SERVER_TAG}{text}")
        } else {
            text.to_string()
        };

        let mut dead = Vec::new();
        for peer in self.snapshot() {
            if !peer.try_send(&line) {
                dead.push(peer.addr);
            }
        }
        for addr in dead {
            if let Some(peer) = self.remove(addr) {
                warn!(addr = %addr, name = ?peer.name(), "Evicting unresponsive client");
            }
        }
    }

    /// Deliver a message to one peer. Returns `false` and evicts the peer if
    /// delivery fails.
    pub fn direct(&self, peer: &Arc<Peer>, text: &str) -> bool {
        if peer.try_send(text) {
            return true;
        }
        if let Some(peer) = self.remove(peer.addr) {
            warn!(addr = %peer.addr, name = ?peer.name(), "Evicting unresponsive client");
        }
        false
    }
}
