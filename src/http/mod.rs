//! HTTP server module.
//!
//! Serves the router over plain HTTP and handles graceful shutdown on
//! SIGTERM/SIGINT, draining in-flight requests before returning so the caller
//! can release the database handle afterwards.

mod server;
mod shutdown;

pub use server::{listen_addr, serve, start_server, ServerError};
