/// CoShop - Main entry point
///
/// A terminal client for browsing, carting and chatting in shared shopping rooms
use anyhow::Context;
use clap::Parser;
use coshop_client::{cli, client::ShopClient, config::Config};
use log::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize logger with appropriate level based on verbose flag
    let log_level = if config.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    info!("Starting CoShop client");
    info!("Server: {}", config.server);

    let state_dir = config
        .state_dir()
        .context("Failed to determine the state directory")?;
    info!("Config directory: {}", state_dir.display());

    let mut client = ShopClient::from_config(&config)
        .await
        .with_context(|| format!("Failed to start client with state in {}", state_dir.display()))?;

    cli::run_client_loop(&mut client)
        .await
        .context("Client loop failed")?;

    Ok(())
}
