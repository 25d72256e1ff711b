//! Folio - A content-managed personal portfolio site

use anyhow::{Context, Result};

use folio::{api, config::Config, config_path, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    tracing::info!("Starting Folio...");

    // Load configuration
    let path = config_path();
    let config = Config::load_with_env(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded");

    // Store, cache, storage and templates
    let state = api::AppState::from_config(&config).await?;

    // Build router
    let app = api::build_router(state, &config);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
