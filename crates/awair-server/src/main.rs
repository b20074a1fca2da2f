mod dto;
mod error;
mod handlers;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use anyhow::Result;
use awair_config::ServerConfig;
use tracing::info;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = ServerConfig::from_env()?;
    let state = Arc::new(AppState::load(&config).await?);

    let app = routes::router(state);

    let addr = config.addr();
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
