//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds the listen endpoint and spawns one Connection task per
//! incoming client. While the roster is at capacity it stops accepting and
//! polls with a short backoff; pending connection attempts queue in the OS
//! listen backlog until a slot frees up.

use crate::config::{Config, LimitsConfig};
use crate::error::BindError;
use crate::handlers::Registry;
use crate::network::Connection;
use crate::state::{Peer, Roster};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

/// Delay between capacity re-checks while the roster is full.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    roster: Arc<Roster>,
    registry: Arc<Registry>,
    limits: LimitsConfig,
}

impl Gateway {
    /// Bind the gateway to the configured address.
    pub async fn bind(
        config: &Config,
        roster: Arc<Roster>,
        registry: Arc<Registry>,
    ) -> Result<Self, BindError> {
        let addr = config.listen.address;
        let listener = TcpListener::bind(addr).await.map_err(|source| BindError {
            addr,
            source,
        })?;
        info!(%addr, "Listener bound");

        Ok(Self {
            listener,
            roster,
            registry,
            limits: config.limits.clone(),
        })
    }

    /// The actually bound address; differs from the configured one when
    /// binding to port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            if self.roster.is_full() {
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }

            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let (tx, rx) = mpsc::channel(self.limits.outbound_queue);
                    let peer = Peer::new(addr, tx);

                    // Notify before inserting: the newcomer is not in the
                    // roster yet and never sees its own accept notice.
                    self.roster
                        .broadcast(&format!("Accepting new client: {addr}"), true);

                    if let Err(e) = self.roster.insert(Arc::clone(&peer)) {
                        // Lost a race to the last slot; the stream drops here.
                        warn!(%addr, error = %e, "Connection dropped at capacity");
                        continue;
                    }

                    info!(%addr, clients = self.roster.len(), "Client connected");

                    let connection = Connection::new(
                        Arc::clone(&peer),
                        rx,
                        stream,
                        Arc::clone(&self.roster),
                        Arc::clone(&self.registry),
                        self.limits.max_line_length,
                    );
                    tokio::spawn(async move {
                        if let Err(e) = connection.run().await {
                            error!(%addr, error = %e, "Connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
