use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tracing::info;

use call_rates_api::config::Config;
use call_rates_api::reconcile::spawn_reconciler;
use call_rates_api::{app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "call_rates_api=debug,tower_http=debug".into()),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(environment = %config.environment, storage = ?config.storage, "configuration loaded");

    // Create application state
    let state = AppState::new(&config).await?;

    // Compensate intents left pending by a previous run, then keep checking
    spawn_reconciler(
        state.dispatcher.clone(),
        config.reconcile_grace,
        config.reconcile_interval,
    );

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
