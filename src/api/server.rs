//! Portal API server lifecycle: starts/stops the axum HTTP server.
//!
//! bind → spawn background task → return handle with shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::portal_api_router;
use crate::core_state::CoreState;

/// Handle to a running portal server.
pub struct PortalServer {
    pub addr: SocketAddr,
    pub started_at: NaiveDateTime,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PortalServer {
    /// Signal a graceful shutdown. In-flight requests are allowed to finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Portal server shutdown signal sent");
        }
    }

    /// Shut down and wait for the serving task to end.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Portal server task failed: {e}");
            }
        }
    }
}

/// Start the portal on the configured bind address.
pub async fn start_server(core: Arc<CoreState>) -> Result<PortalServer, String> {
    let addr = core.config.bind_addr;
    start_server_on(core, addr).await
}

/// Start the portal on a specific address. Port 0 picks an ephemeral port.
pub async fn start_server_on(
    core: Arc<CoreState>,
    bind: SocketAddr,
) -> Result<PortalServer, String> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| format!("Failed to bind portal server on {bind}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let started_at = core.now();
    let app = portal_api_router(core);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Portal server received shutdown signal");
        };

        tracing::info!(%addr, "Portal server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Portal server error: {e}");
        }

        tracing::info!("Portal server stopped");
    });

    Ok(PortalServer {
        addr,
        started_at,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}
