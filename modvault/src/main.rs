//! Modvault daemon entry point.

use std::path::Path;
use std::sync::Arc;

use modvault::ModvaultServer;
use modvault::host::HeadlessHost;
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "config/modvault_config.json5";

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let server = ModvaultServer::new(Path::new(CONFIG_PATH), Arc::new(HeadlessHost))?;
    let ticker = server.start();

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    server.stop();
    ticker.await?;
    Ok(())
}
