//! Trail server - HTTP frontend for terrain-aware hiking routes.

mod api;
mod config;
mod pipeline;
mod providers;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trail_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting trail server...");

    let config = Config::from_env();
    if config.imagery_api_key.is_empty() {
        tracing::warn!("TRAIL_IMAGERY_API_KEY is empty; imagery requests will be rejected upstream");
    }
    let port = config.server_port;
    let state = Arc::new(AppState::new(config)?);

    let app = api::create_router()
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
