use anyhow::{Context, Result};
use tracing::info;

use dorm_admin_api::{
    app::{self, Backends},
    config::Config,
    middleware,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting Dorm Admin API v{}", env!("CARGO_PKG_VERSION"));
    info!(
        endpoint = %config.backend.endpoint,
        project_id = %config.backend.project_id,
        database_id = %config.backend.database_id,
        "Using hosted backend"
    );

    let backends = Backends::remote(&config).context("failed to create backend client")?;
    let addr = config
        .socket_addr()
        .context("invalid server host or port")?;

    let app = app::create_app(config, backends);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
