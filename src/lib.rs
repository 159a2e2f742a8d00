pub mod api;
pub mod calendar;
pub mod config;
pub mod core_state; // Shared state: config + database access
pub mod dashboard;
pub mod db;
pub mod models;
pub mod notifications; // Reminder intervals, dispatch job and scheduler

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Start the portal: HTTP API plus reminder scheduler, until Ctrl-C.
pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let config = config::AppConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        "{} starting v{} (app url {})",
        config::APP_NAME,
        config::APP_VERSION,
        config.app_url
    );

    let core = Arc::new(core_state::CoreState::new(config));

    // Opening applies pending migrations.
    match core.open_db() {
        Ok(conn) => tracing::info!(
            schema_version = db::get_current_version(&conn),
            path = ?core.db_path(),
            "Database ready"
        ),
        Err(e) => tracing::warn!(
            error = %e,
            "Database unavailable, reads will return empty results"
        ),
    }

    let scheduler = notifications::scheduler::start_reminder_scheduler(core.clone());
    let server = api::server::start_server(core)
        .await
        .map_err(anyhow::Error::msg)?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown requested");

    server.stop().await;
    scheduler.stop().await;
    Ok(())
}
