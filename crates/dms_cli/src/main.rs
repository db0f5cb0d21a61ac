//! Shift DMS command-line front end

mod cli;
mod commands;
mod settings;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::settings::SettingsManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut manager = SettingsManager::new(cli.data_dir.clone());
    manager.load_sync()?;

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        manager.get().logging.level.clone()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    if let Some(e) = manager.parse_error() {
        tracing::warn!("Failed to parse settings file, using defaults: {}", e);
    }
    tracing::debug!("Data directory: {:?}", manager.data_dir());

    let output = commands::run(cli, manager).await?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
