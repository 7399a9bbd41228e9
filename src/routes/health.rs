//! Health check endpoint for container orchestration.
//!
//! Every request runs one fresh database probe. The JSON body is fixed per
//! outcome so monitors can match on it; probe error details only go to the log.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::health::HealthStatus;
use crate::state::AppState;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_ERROR: &str = "error";
pub const MESSAGE_ACTIVE: &str = "AIMS System is running";
pub const MESSAGE_DB_UNREACHABLE: &str = "Database not reachable";

/// JSON body of `GET /health`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl HealthResponse {
    /// HTTP status and body for a probe outcome.
    pub fn from_status(status: HealthStatus) -> (StatusCode, Self) {
        if status.ok {
            (
                StatusCode::OK,
                HealthResponse {
                    status: STATUS_ACTIVE,
                    message: MESSAGE_ACTIVE,
                },
            )
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HealthResponse {
                    status: STATUS_ERROR,
                    message: MESSAGE_DB_UNREACHABLE,
                },
            )
        }
    }
}

/// Health check handler.
///
/// 200 when the database answered the probe, 500 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, body) = HealthResponse::from_status(state.health.probe().await);
    (code, Json(body))
}
