//! HTTP route handlers.
//!
//! The service exposes a single route, `GET /health`. Request tracing is enabled
//! via middleware that tags every log line with a request ID.

pub mod health;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CACHE_CONTROL_HEALTH;
use crate::middleware::request_id_layer;
use crate::state::AppState;

pub const PATH_HEALTH: &str = "/health";

/// Creates the Axum router.
pub fn create_router(state: AppState) -> Router {
    // Health check - never cached, always a fresh probe
    let health_routes = Router::new()
        .route(PATH_HEALTH, get(health::health))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_HEALTH),
        ));

    Router::new()
        .merge(health_routes)
        .with_state(state)
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
