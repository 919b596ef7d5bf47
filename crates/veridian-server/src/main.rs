//! Veridian Server
//!
//! HTTP server for the Veridian credential platform.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veridian_server::{create_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "veridian_server=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Create application state from the environment
    let state = AppState::from_env().context("failed to build application state")?;

    let app = create_router(state);

    // Start server
    let addr = std::env::var("VERIDIAN_BIND").unwrap_or_else(|_| "0.0.0.0:4000".to_string());

    tracing::info!("Starting Veridian server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
