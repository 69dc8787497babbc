//! Nutrilog API Server
//!
//! Run with: cargo run --bin nutrilog-api
//!
//! # Configuration
//!
//! Read from `nutrilog.toml` (or the standard config locations), then
//! environment variables:
//! - `NUTRILOG_HOST`: Host to bind to (default: 0.0.0.0)
//! - `PORT` / `NUTRILOG_PORT`: Port to listen on (default: 5000)
//! - `SPOONACULAR_API_KEY`: Enables search and nutrition lookups
//! - `RUST_LOG`: Log filter (default: nutrilog=info,tower_http=debug)

use nutrilog::api::{serve, AppState};
use nutrilog::config::Config;
use nutrilog::provider::SpoonacularClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("nutrilog={},tower_http=debug", config.logging.level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Nutrilog API server v{}", env!("CARGO_PKG_VERSION"));

    let server_config = config.server;
    let provider = SpoonacularClient::from_config(&server_config)?;
    match &provider {
        Some(_) => tracing::info!(
            "Spoonacular provider enabled: {}",
            server_config.spoonacular_base_url
        ),
        None => tracing::info!("Spoonacular provider disabled (set SPOONACULAR_API_KEY to enable)"),
    }

    let state = AppState::new(provider, server_config.clone());

    tracing::info!("Starting server on {}", server_config.addr());
    serve(state, &server_config).await?;

    tracing::info!("Nutrilog API server stopped");
    Ok(())
}
