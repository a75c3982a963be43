use anyhow::Result;
use std::sync::Arc;
use stratus::api::{RestClient, StaticTokenProvider};
use stratus::config::Config;
use stratus::sync::SyncCoordinator;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;

    stratus::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Stratus charging-cloud sync starting up");

    let credentials = Arc::new(StaticTokenProvider::from_config(&config));
    let client = RestClient::new(&config.api, credentials)
        .map_err(|e| anyhow::anyhow!("Failed to create API client: {}", e))?;

    let mut coordinator = SyncCoordinator::new(config, Arc::new(client));
    let shutdown = coordinator.shutdown_handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            shutdown.shutdown();
        }
    });

    match coordinator.run().await {
        Ok(()) => {
            info!("Sync loop shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Sync loop failed with error: {}", e);
            Err(anyhow::anyhow!("Sync error: {}", e))
        }
    }
}
