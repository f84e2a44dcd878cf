//! HTTP server for the management API.

use std::net::SocketAddr;

use tracing::{error, info};

use crate::error::Result;

use super::handlers::{router, AppState};

/// HTTP server wrapping the management router.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// Shared component state
    state: AppState,
}

impl HttpServer {
    /// Create a new server bound to `addr` with the given shared state.
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Start the server.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "Starting management API server");

        axum::serve(listener, router(self.state)).await.map_err(|e| {
            error!(error = %e, "Management API server failed");
            e.into()
        })
    }

    /// Start the server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!(
            addr = %self.addr,
            "Starting management API server with graceful shutdown"
        );

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "Management API server failed");
                e.into()
            })
    }
}
