//! chatterd - a small multi-client chatroom daemon.

use chatterd::config::Config;
use chatterd::handlers::Registry;
use chatterd::network::Gateway;
use chatterd::state::Roster;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        server = %config.server.name,
        address = %config.listen.address,
        capacity = config.limits.max_clients,
        "Starting chatterd"
    );

    let roster = Arc::new(Roster::new(config.limits.max_clients));
    let registry = Arc::new(Registry::new());

    let gateway = Gateway::bind(&config, roster, registry).await?;
    gateway.run().await
}
