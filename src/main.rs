use anyhow::Result;
use dotenvy::dotenv;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn check_env() -> Result<()> {
    if env::var("OMDB_API_KEY").is_err() {
        anyhow::bail!("Missing required environment variable: OMDB_API_KEY");
    }
    info!("All required environment variables are set");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    match dotenv() {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }
    check_env()?;
    popcorn::app::run_server().await
}
