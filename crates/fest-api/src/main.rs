//! # fest-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the fest portal API.
//! Binds to a configurable port (default 8080).

use fest_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(?config, "starting fest-api");
    let port = config.port;

    // Open the database and hydrate the stores, or run memory-only when
    // DATABASE_URL is absent.
    let state = AppState::connect(config).await.map_err(|e| {
        tracing::error!("startup failed: {e}");
        e
    })?;

    let app = fest_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("fest API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
