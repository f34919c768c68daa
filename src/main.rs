use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use blog_api_rust::cli::Cli;
use blog_api_rust::database::DatabaseManager;
use blog_api_rust::{AppState, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, BLOG_TOKEN_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting blog in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to open database")?;
    let state = AppState::new(&config, pool).context("failed to build application state")?;

    let server = Server::bind(&config.server.addr, state, config.security.enable_cors)
        .await
        .with_context(|| format!("failed to bind {}", config.server.addr))?;

    server.run().await.context("server error")?;
    tracing::info!("Shutdown complete");
    Ok(())
}
