//! Observer HTTP server lifecycle management.
//!
//! [`bind`] claims the TCP port up front so startup can fail fast, and
//! [`serve`] runs the Axum server on it until the task is aborted or the
//! runtime shuts down.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Configuration for the Observer server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl ServerConfig {
    /// Parse `host:port` into a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address does not parse.
    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse()
            .map_err(|e| ServerError::Bind(format!("invalid address {raw}: {e}")))
    }
}

/// Bind the listener for `config`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or the port
/// is unavailable.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = config.addr()?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
}

/// Serve the Observer router on an already-bound listener.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server hits a fatal I/O error.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Observer server listening");
    }
    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))
}

/// Errors that can occur when starting or running the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_host_parses() {
        let config = ServerConfig {
            host: String::from("0.0.0.0"),
            port: 8080,
        };
        assert!(config.addr().is_ok_and(|a| a.port() == 8080));
    }

    #[test]
    fn bad_host_is_a_bind_error() {
        let config = ServerConfig {
            host: String::from("not a host"),
            port: 1,
        };
        assert!(matches!(config.addr(), Err(ServerError::Bind(_))));
    }
}
