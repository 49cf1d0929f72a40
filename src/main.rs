mod commands;

use anyhow::Context;
use clap::Parser;
use commands::Cli;
use letmeknock::config::AppConfig;
use letmeknock::App;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_env();
    let app = App::from_config(config).context("Failed to set up backend client")?;
    app.auth().restore().await;

    commands::run(&app, cli.command).await
}
