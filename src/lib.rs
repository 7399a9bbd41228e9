//! AIMS backend service.
//!
//! Opens one PostgreSQL connection pool at startup and exposes `GET /health`,
//! which reports whether the service and its database are reachable.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod health;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::AppError;
