//! Configuration loading and management.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server identity.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    pub listen: ListenConfig,
    /// Capacity and protocol limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, used in logs.
    #[serde(default = "default_server_name")]
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
        }
    }
}

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "127.0.0.1:9123").
    pub address: SocketAddr,
}

/// Capacity and protocol limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum number of simultaneous client connections.
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    /// Per-client outbound queue depth. A client whose queue fills up is
    /// evicted rather than allowed to stall delivery to everyone else.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
    /// Maximum length of a single command line, in bytes.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_clients: default_max_clients(),
            outbound_queue: default_outbound_queue(),
            max_line_length: default_max_line_length(),
        }
    }
}

fn default_server_name() -> String {
    "chatterd".to_string()
}

fn default_max_clients() -> usize {
    10
}

fn default_outbound_queue() -> usize {
    32
}

fn default_max_line_length() -> usize {
    512
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
