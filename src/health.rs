//! Liveness reporting for the service and its database dependency.
//!
//! [`HealthReporter::probe`] performs exactly one round-trip against the shared
//! handle per call and folds every failure (closed pool, driver error, timeout)
//! into a coarse [`HealthStatus`]. The cause is logged; callers only ever see
//! the fixed message.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::timeout;

/// Message carried by a successful probe
pub const SERVICE_RUNNING: &str = "service is running";

/// Message carried by a failed probe
pub const DATABASE_UNREACHABLE: &str = "database not reachable";

/// Failure of a single liveness probe. Never surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Connection pool is closed")]
    Closed,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),
}

/// Something whose liveness can be checked with a cheap round-trip.
///
/// Implemented by [`crate::database::Database`]; tests substitute their own.
#[async_trait]
pub trait LivenessCheck: Send + Sync {
    async fn ping(&self) -> Result<(), ProbeError>;
}

/// Outcome of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub message: &'static str,
}

impl HealthStatus {
    pub fn running() -> Self {
        Self {
            ok: true,
            message: SERVICE_RUNNING,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            ok: false,
            message: DATABASE_UNREACHABLE,
        }
    }
}

/// Answers "is this service and its database operational right now?"
#[derive(Clone)]
pub struct HealthReporter {
    check: Arc<dyn LivenessCheck>,
    probe_timeout: Duration,
}

impl HealthReporter {
    pub fn new(check: Arc<dyn LivenessCheck>, probe_timeout: Duration) -> Self {
        Self {
            check,
            probe_timeout,
        }
    }

    /// Run a single probe. No retries; a slow database counts as unreachable
    /// once `probe_timeout` elapses.
    pub async fn probe(&self) -> HealthStatus {
        match self.try_probe().await {
            Ok(()) => {
                tracing::debug!("Liveness probe succeeded");
                HealthStatus::running()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Liveness probe failed");
                HealthStatus::unreachable()
            }
        }
    }

    async fn try_probe(&self) -> Result<(), ProbeError> {
        timeout(self.probe_timeout, self.check.ping())
            .await
            .map_err(|_| ProbeError::Timeout(self.probe_timeout))?
    }
}
