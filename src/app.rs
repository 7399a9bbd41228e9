//! Service startup and teardown.
//!
//! [`run`] is the whole process lifecycle: read credentials, open the database,
//! serve until a shutdown signal, then close the database. Any failure before
//! the server is listening is returned to the caller; nothing here exits the
//! process.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, ConnectionConfig};
use crate::database::Database;
use crate::error::AppError;
use crate::health::HealthReporter;
use crate::http::{listen_addr, start_server};
use crate::routes::create_router;
use crate::state::AppState;

/// Run the service until shutdown.
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    // Fail on a bad listen address before touching the database
    listen_addr(&config.http)?;

    let connection = ConnectionConfig::from_env(&config.database)?;
    tracing::info!(target_dsn = %connection, "Loaded database configuration");

    let database = Database::connect(&connection, &config.database).await?;

    let result = serve(&config, database.clone()).await;

    database.close().await;
    result
}

async fn serve(config: &AppConfig, database: Database) -> Result<(), AppError> {
    let probe_timeout = Duration::from_secs(config.database.probe_timeout_seconds);
    let health = HealthReporter::new(Arc::new(database), probe_timeout);

    let app = create_router(AppState::new(health));
    start_server(app, &config.http).await?;
    Ok(())
}
