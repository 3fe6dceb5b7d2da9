//! OhMyBot Daemon - anonymous team feedback bot
//!
//! Receives Bot Framework activities, stores hashtagged feedback and answers
//! retrievals and clarification requests.

use anyhow::Result;
use ohmybotd::config::Config;
use ohmybotd::server;
use ohmybotd::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up secrets from .env before anything reads the environment
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("OhMyBot Daemon v{} starting", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = Config::load();
    let state = AppState::from_config(config)?;

    server::run(state).await
}
