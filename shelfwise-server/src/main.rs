//! Shelfwise Server - REST API for book recommendations
//!
//! Exposes shelfwise-core via HTTP endpoints:
//! - POST /recommend - Similar books for a title
//! - POST /train - Rebuild the model from the configured dataset
//! - GET /health, GET /ready - Monitoring

use std::net::SocketAddr;

use shelfwise_core::RecommendationService;
use shelfwise_server::{create_router_with_config, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("shelfwise_server=info,shelfwise_core=info,tower_http=info")
        }))
        .init();

    let config = Config::from_env();
    tracing::info!(
        artifacts_dir = %config.engine.artifacts_dir.display(),
        ratings = %config.engine.ratings_csv.display(),
        books = %config.engine.books_csv.display(),
        "Starting shelfwise-server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let engine = config.engine.clone();
    let service = tokio::task::spawn_blocking(move || RecommendationService::open(engine)).await??;
    let app = create_router_with_config(&config, AppState::new(service));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
