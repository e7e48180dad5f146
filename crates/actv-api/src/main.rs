//! # actv-api: Binary Entry Point
//!
//! Reads configuration from the environment, opens the code store and
//! serves the activation API (default port 8080).

use actv_api::config::AppConfig;
use actv_api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Initialize structured tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(?config, "starting activation service");
    if config.signer.is_none() {
        tracing::warn!("LICENSE_PRIVATE_KEY not set; every redemption will fail with SERVER_ERROR");
    }

    let state = AppState::from_config(&config).await.map_err(|e| {
        tracing::error!("Code store initialization failed: {e}");
        e
    })?;

    let app = actv_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("activation API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
