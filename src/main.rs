use anyhow::Context;
use tracing_subscriber::EnvFilter;

use portal::{AppConfig, Portal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::info!(
        database = %config.database.database,
        host = %config.database.host,
        "Configuration loaded"
    );

    Portal::new(config).serve().await.context("server error")?;
    Ok(())
}
