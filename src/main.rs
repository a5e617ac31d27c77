//! Royale Game Server
//!
//! Loads configuration from the environment, opens the store and serves
//! until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use royale::{GameServer, KeyValueStore, ServerConfig, TICK_RATE, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = ServerConfig::from_env();

    info!("Royale Server v{}", VERSION);
    info!("Tick: {} ms (nominal {} Hz)", config.tick_ms, TICK_RATE);
    info!("Bots per match: {}", config.bots);

    let store = match &config.store_path {
        Some(path) => KeyValueStore::load(path, config.store_quota)
            .await
            .with_context(|| format!("Failed to open store {}", path.display()))?,
        None => KeyValueStore::new(config.store_quota),
    };

    let store_path = config.store_path.clone();
    let server = Arc::new(GameServer::new(config, store));

    let signal_server = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_server.shutdown();
        }
    });

    server.run().await?;

    if let Some(path) = store_path {
        match server.store().save(&path).await {
            Ok(()) => info!("Store saved to {}", path.display()),
            Err(e) => warn!("Failed to save store to {}: {}", path.display(), e),
        }
    }

    info!("Server stopped");
    Ok(())
}
