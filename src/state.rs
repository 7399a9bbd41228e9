//! Shared application state for request handlers.

use crate::health::HealthReporter;

/// Shared application state, cloned into each handler.
///
/// Built once at startup and handed to the router. The health reporter holds
/// the only database handle in the process, so replacing the handle means
/// building a new state rather than mutating this one.
#[derive(Clone)]
pub struct AppState {
    pub health: HealthReporter,
}

impl AppState {
    pub fn new(health: HealthReporter) -> Self {
        Self { health }
    }
}
