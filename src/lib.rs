pub mod api;
pub mod auth;
pub mod authorization;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod identity;
pub mod models;
pub mod pipeline;
pub mod records;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Start the service: logging, config, database, outbound clients, HTTP
/// server. Returns once Ctrl-C has been received and the server stopped.
pub async fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env();
    db::open_database(&config.database_path).map_err(|e| e.to_string())?;
    tracing::info!(path = %config.database_path.display(), "Database ready");

    let bind_addr = config.bind_addr;
    // Blocking HTTP clients own a runtime of their own; build them off the async one.
    let core = tokio::task::spawn_blocking(move || core_state::CoreState::from_config(config))
        .await
        .map_err(|e| format!("Startup task failed: {e}"))?
        .map_err(|e| e.to_string())?;

    let mut server = api::start_api_server(Arc::new(core), bind_addr).await?;
    tracing::info!(addr = %server.addr, "Listening");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Cannot listen for shutdown signal: {e}"))?;
    server.shutdown();
    Ok(())
}
