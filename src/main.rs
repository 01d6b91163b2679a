use anyhow::Context;
use tracing_subscriber::EnvFilter;

use campus_nav_api::config;
use campus_nav_api::database::DatabaseManager;
use campus_nav_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("campus_nav_api=info,tower_http=info")),
        )
        .init();

    let config = config::config();
    config.validate().map_err(anyhow::Error::msg).context("invalid configuration")?;
    tracing::info!("Starting Campus Navigation API in {:?} mode", config.environment);

    let db = DatabaseManager::connect_lazy(&config.database).context("failed to configure database pool")?;
    if config.database.run_migrations {
        if let Err(e) = db.run_migrations().await {
            tracing::warn!("Migrations not applied: {}", e);
        }
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(db.clone())))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
