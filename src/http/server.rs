//! HTTP server startup logic.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::Router;
use axum_server::Handle;

use crate::config::HttpServerConfig;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen address {host}:{port}: {reason}")]
    InvalidAddress {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve the configured host and port into a socket address.
pub fn listen_addr(config: &HttpServerConfig) -> Result<SocketAddr, ServerError> {
    let ip: IpAddr = config
        .host
        .parse()
        .map_err(|e: std::net::AddrParseError| ServerError::InvalidAddress {
            host: config.host.clone(),
            port: config.port,
            reason: e.to_string(),
        })?;
    Ok(SocketAddr::new(ip, config.port))
}

/// Start the HTTP server with signal-driven graceful shutdown.
///
/// This function blocks until the server shuts down.
pub async fn start_server(app: Router, config: &HttpServerConfig) -> Result<(), ServerError> {
    let addr = listen_addr(config)?;
    let handle = Handle::new();

    shutdown::setup_shutdown_handler(
        handle.clone(),
        Duration::from_secs(config.shutdown_grace_seconds),
    );

    serve(app, addr, handle).await
}

/// Serve `app` on `addr` until `handle` is told to shut down.
pub async fn serve(app: Router, addr: SocketAddr, handle: Handle) -> Result<(), ServerError> {
    tracing::info!(%addr, "Starting HTTP server");

    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
