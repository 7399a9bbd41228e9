//! Database connection management.
//!
//! A single [`Database`] is opened at startup and shared by every request for the
//! rest of the process lifetime. It wraps an `sqlx` PostgreSQL pool, which is safe
//! for concurrent use and cheap to clone, so handlers never need their own locking.
//!
//! The pool's own acquire path retries refused connections until its timeout,
//! so neither startup nor the liveness ping goes through it: both make exactly
//! one direct connection attempt and report that attempt's error.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions, PgSslMode};
use sqlx::Connection;
use tokio::time::timeout;

use crate::config::{ConnectionConfig, DatabaseSettings};
use crate::health::{LivenessCheck, ProbeError};

const SET_TIMEZONE_SQL: &str = "SELECT set_config('TimeZone', $1, false)";

/// Failure to open the startup connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Invalid connection settings: {0}")]
    InvalidConfig(String),

    #[error("Failed to connect to database at {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: sqlx::Error,
    },

    #[error("Timed out after {timeout:?} connecting to database at {host}:{port}")]
    Timeout {
        host: String,
        port: u16,
        timeout: Duration,
    },
}

/// The process-wide database handle.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
    options: PgConnectOptions,
}

impl Database {
    /// Verify the database with one connection attempt, then open the pool.
    ///
    /// Fails if the settings are malformed, the attempt fails (refused, rejected
    /// credentials, unknown timezone), or it does not finish within
    /// `connect_timeout_seconds`. There is no retry.
    pub async fn connect(
        config: &ConnectionConfig,
        settings: &DatabaseSettings,
    ) -> Result<Self, ConnectionError> {
        validate(config)?;

        tracing::debug!(target_dsn = %config, "Connecting to database");

        let limit = Duration::from_secs(settings.connect_timeout_seconds);
        let connect_error = |source| ConnectionError::Connect {
            host: config.host.clone(),
            port: config.port,
            source,
        };

        let options = connect_options(config);
        let mut conn = timeout(limit, open_session(&options, &config.timezone))
            .await
            .map_err(|_| ConnectionError::Timeout {
                host: config.host.clone(),
                port: config.port,
                timeout: limit,
            })?
            .map_err(connect_error)?;
        conn.ping().await.map_err(connect_error)?;
        // The verified connection cannot be handed to the pool; it opens its own
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "Closing verification connection failed");
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            max_connections = settings.max_connections,
            "Connected to database"
        );

        Ok(Self::lazy(config, settings))
    }

    /// Pool that connects on demand.
    fn lazy(config: &ConnectionConfig, settings: &DatabaseSettings) -> Self {
        let options = connect_options(config);
        let pool = pool_options(config, settings).connect_lazy_with(options.clone());
        Self { pool, options }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every pooled connection. Later probes report the database as unreachable.
    pub async fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        self.pool.close().await;
        tracing::info!("Database connection closed");
    }
}

#[async_trait]
impl LivenessCheck for Database {
    /// Ping an idle pooled connection if one is available, otherwise make a
    /// single fresh connection attempt.
    async fn ping(&self) -> Result<(), ProbeError> {
        if self.pool.is_closed() {
            return Err(ProbeError::Closed);
        }
        if let Some(mut conn) = self.pool.try_acquire() {
            conn.ping().await?;
            return Ok(());
        }
        let mut conn = PgConnection::connect_with(&self.options).await?;
        conn.ping().await?;
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "Closing ping connection failed");
        }
        Ok(())
    }
}

async fn open_session(options: &PgConnectOptions, timezone: &str) -> Result<PgConnection, sqlx::Error> {
    let mut conn = PgConnection::connect_with(options).await?;
    sqlx::query(SET_TIMEZONE_SQL)
        .bind(timezone)
        .execute(&mut conn)
        .await?;
    Ok(conn)
}

fn validate(config: &ConnectionConfig) -> Result<(), ConnectionError> {
    let fields = [
        ("host", &config.host),
        ("user", &config.user),
        ("password", &config.password),
        ("database", &config.database),
        ("timezone", &config.timezone),
    ];
    if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(ConnectionError::InvalidConfig(format!("{} is empty", name)));
    }
    if config.port == 0 {
        return Err(ConnectionError::InvalidConfig("port must be positive".to_string()));
    }
    Ok(())
}

fn connect_options(config: &ConnectionConfig) -> PgConnectOptions {
    PgConnectOptions::new_without_pgpass()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database)
        .ssl_mode(PgSslMode::Disable)
}

fn pool_options(config: &ConnectionConfig, settings: &DatabaseSettings) -> PgPoolOptions {
    // idle_timeout_seconds = 0 keeps idle connections open indefinitely
    let idle_timeout =
        (settings.idle_timeout_seconds > 0).then(|| Duration::from_secs(settings.idle_timeout_seconds));

    // sqlx sends TimeZone=UTC in the startup packet, so the zone is set per session instead
    let timezone = config.timezone.clone();

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        // One warm connection survives idle_timeout so pings usually skip the connect
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout_seconds))
        .idle_timeout(idle_timeout)
        .after_connect(move |conn, _meta| {
            let timezone = timezone.clone();
            Box::pin(async move {
                sqlx::query(SET_TIMEZONE_SQL)
                    .bind(timezone)
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
}
