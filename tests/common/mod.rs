//! Integration test common infrastructure.
//!
//! Spawns in-process chatterd gateways on ephemeral ports and provides a
//! line-based test client with timeouts and predicates.

// Each test binary compiles this module separately and uses a subset of it.
#![allow(dead_code)]

use chatterd::config::{Config, LimitsConfig, ListenConfig, ServerConfig};
use chatterd::handlers::Registry;
use chatterd::network::Gateway;
use chatterd::state::Roster;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec};

/// An in-process test server.
pub struct TestServer {
    addr: SocketAddr,
    pub roster: Arc<Roster>,
}

impl TestServer {
    /// Spawn a test server with the default capacity.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with_capacity(10).await
    }

    /// Spawn a test server with a custom connection capacity.
    pub async fn spawn_with_capacity(max_clients: usize) -> anyhow::Result<Self> {
        let config = Config {
            server: ServerConfig::default(),
            listen: ListenConfig {
                address: "127.0.0.1:0".parse()?,
            },
            limits: LimitsConfig {
                max_clients,
                ..LimitsConfig::default()
            },
        };

        let roster = Arc::new(Roster::new(config.limits.max_clients));
        let registry = Arc::new(Registry::new());
        let gateway = Gateway::bind(&config, Arc::clone(&roster), registry).await?;
        let addr = gateway.local_addr()?;

        tokio::spawn(async move {
            let _ = gateway.run().await;
        });

        Ok(Self { addr, roster })
    }

    /// The server's listen address.
    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    /// Connect a new test client.
    pub async fn connect(&self) -> anyhow::Result<TestClient> {
        TestClient::connect(self.addr).await
    }

    /// Connect and register a name, draining the banner and join replies.
    pub async fn join(&self, name: &str) -> anyhow::Result<TestClient> {
        let mut client = self.connect().await?;
        client.recv_banner().await?;
        client.send(&format!("join {name}")).await?;
        client
            .recv_until_contains("Type 'help' for a list of commands.")
            .await?;
        Ok(client)
    }
}

/// A line-based test client.
pub struct TestClient {
    framed: Framed<TcpStream, LinesCodec>,
}

impl TestClient {
    /// Connect to a test server.
    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            framed: Framed::new(stream, LinesCodec::new()),
        })
    }

    /// Send one command line.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.framed.send(line.to_string()).await?;
        Ok(())
    }

    /// Receive a single line with the default timeout.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a single line with a timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        match timeout(dur, self.framed.next()).await {
            Ok(Some(Ok(line))) => Ok(line),
            Ok(Some(Err(e))) => Err(e.into()),
            Ok(None) => anyhow::bail!("connection closed"),
            Err(_) => anyhow::bail!("timed out waiting for a line"),
        }
    }

    /// Receive lines until one contains `needle`; returns everything read.
    pub async fn recv_until_contains(&mut self, needle: &str) -> anyhow::Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let line = self.recv().await?;
            let done = line.contains(needle);
            lines.push(line);
            if done {
                return Ok(lines);
            }
        }
    }

    /// Drain the three-line connect banner.
    pub async fn recv_banner(&mut self) -> anyhow::Result<()> {
        self.recv_until_contains("YOU DO NOT HAVE A NAME!").await?;
        Ok(())
    }

    /// Drain any lines that arrive within a short quiet period.
    pub async fn drain(&mut self) {
        while self
            .recv_timeout(Duration::from_millis(100))
            .await
            .is_ok()
        {}
    }
}
