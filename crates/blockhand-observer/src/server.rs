//! Binding and serving the observer router.

use std::io;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Where the observer listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface or host name; `0.0.0.0` listens on every interface.
    pub host: String,
    /// Port for the dashboard, REST endpoints, and telemetry socket.
    /// `0` picks a free one.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 3000,
        }
    }
}

/// Serve the observer for `state` until the listener fails.
///
/// # Errors
///
/// [`ServerError::Bind`] if the host does not resolve or the port is taken,
/// [`ServerError::Serve`] if the accept loop dies.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|source| ServerError::Bind {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;
    let addr = listener.local_addr().map_err(ServerError::Serve)?;
    info!(%addr, "observer listening");

    axum::serve(listener, build_router(state))
        .await
        .map_err(ServerError::Serve)
}

/// Why the observer stopped.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listener could not be opened.
    #[error("cannot listen on {host}:{port}: {source}")]
    Bind {
        /// Requested host.
        host: String,
        /// Requested port.
        port: u16,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// The accept loop failed.
    #[error("observer server stopped: {0}")]
    Serve(#[source] io::Error),
}
