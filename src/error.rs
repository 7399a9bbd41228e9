//! Fatal startup errors.
//!
//! Anything that stops the service from reaching a listening state ends up here
//! and is handed back to `main`, which logs it and exits non-zero. Per-request
//! probe failures never reach this type; they are folded into a health response.

use crate::config::ConfigError;
use crate::database::ConnectionError;
use crate::http::ServerError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Server(#[from] ServerError),
}
