//! Observer server startup helper for embedding in the engine binary.
//!
//! [`spawn_observer`] binds the listener eagerly, so a taken port is
//! reported to the caller, then serves on a background Tokio task while
//! the driver loop runs.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the Observer HTTP server on a background Tokio task.
///
/// Binds to `0.0.0.0:{port}`. Port `0` picks a free port, which is
/// logged once the server is listening.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the listener cannot bind.
pub async fn spawn_observer(
    port: u16,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let config = ServerConfig {
        host: String::from("0.0.0.0"),
        port,
    };
    let listener = server::bind(&config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(port, "Observer server spawned on background task");

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawns_on_ephemeral_port() {
        let state = Arc::new(AppState::new());
        let handle = spawn_observer(0, state).await;
        assert!(handle.is_ok());
        if let Ok(h) = handle {
            h.abort();
        }
    }
}
