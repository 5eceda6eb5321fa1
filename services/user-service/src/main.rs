//! User Service - Main Entry Point

use service_base::{AppConfig, init_tracing, server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.tracing_config())?;

    info!(version = %config.service_version, "Starting user service");
    let app = user_service::app(&config);
    server::serve(app, &config).await?;

    info!("User service stopped");
    Ok(())
}
