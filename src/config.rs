//! Configuration loading and constants.
//!
//! Service tuning (listen address, pool sizing, timeouts, log format) comes from an
//! optional TOML file; every field has a default so the service can run without one.
//! Database credentials are never read from the file: they come from the `DB_*`
//! environment variables and are assembled into a [`ConnectionConfig`]. A `.env`
//! file, when present, is loaded into the environment first; variables already
//! set in the process win over the file.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

// =============================================================================
// HTTP Defaults
// =============================================================================

/// Default listen host (all interfaces)
pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Time allowed for in-flight requests to finish after a shutdown signal
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;

/// Cache-Control value for health responses; probes must never be served from cache
pub const CACHE_CONTROL_HEALTH: &str = "no-store";

// =============================================================================
// Database Defaults
// =============================================================================

/// Session timezone applied to every connection
pub const DEFAULT_DB_TIMEZONE: &str = "Asia/Kolkata";

/// Maximum pooled connections
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;

/// Time allowed to establish (or acquire) a connection
pub const DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Idle connections are closed after this long
pub const DEFAULT_DB_IDLE_TIMEOUT_SECS: u64 = 30;

/// Upper bound on a single liveness probe
pub const DEFAULT_DB_PROBE_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// Environment Variables
// =============================================================================

pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DB_NAME: &str = "DB_NAME";
pub const ENV_DB_PORT: &str = "DB_PORT";

/// All variables that must be present before the service may start
pub const REQUIRED_DB_ENV: [&str; 5] = [
    ENV_DB_HOST,
    ENV_DB_USER,
    ENV_DB_PASSWORD,
    ENV_DB_NAME,
    ENV_DB_PORT,
];

// =============================================================================
// Logging
// =============================================================================

/// Default log filter when neither --log-level nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "aims_backend=debug,tower_http=info";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server configuration
    pub http: HttpServerConfig,
    /// Connection pool and probe settings
    pub database: DatabaseSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for open connections after SIGTERM/SIGINT
    pub shutdown_grace_seconds: u64,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            shutdown_grace_seconds: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

/// Database settings that are safe to keep in a config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// IANA zone set as the session TimeZone on every connection
    pub timezone: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub probe_timeout_seconds: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_DB_TIMEZONE.to_string(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            connect_timeout_seconds: DEFAULT_DB_CONNECT_TIMEOUT_SECS,
            idle_timeout_seconds: DEFAULT_DB_IDLE_TIMEOUT_SECS,
            probe_timeout_seconds: DEFAULT_DB_PROBE_TIMEOUT_SECS,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to built-in defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::Validation("http.port must be non-zero".to_string()));
        }
        let db = &self.database;
        if db.timezone.trim().is_empty() {
            return Err(ConfigError::Validation(
                "database.timezone must not be empty".to_string(),
            ));
        }
        if db.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if db.connect_timeout_seconds == 0 || db.probe_timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "database timeouts must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Credentials and endpoint for the single database connection.
///
/// Built once at startup and never mutated. The password is kept out of
/// `Debug` and `Display` output so the value can be logged freely.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
    pub timezone: String,
}

impl ConnectionConfig {
    /// Read the `DB_*` variables from the process environment.
    pub fn from_env(settings: &DatabaseSettings) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), settings)
    }

    /// Build from an arbitrary key lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F, settings: &DatabaseSettings) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let host = require(ENV_DB_HOST)?;
        let user = require(ENV_DB_USER)?;
        let password = require(ENV_DB_PASSWORD)?;
        let database = require(ENV_DB_NAME)?;
        let raw_port = require(ENV_DB_PORT)?;
        let port = parse_port(raw_port.trim()).ok_or_else(|| ConfigError::InvalidVar {
            name: ENV_DB_PORT,
            reason: format!("'{}' is not a port number between 1 and 65535", raw_port),
        })?;

        Ok(Self {
            host,
            user,
            password,
            database,
            port,
            timezone: settings.timezone.clone(),
        })
    }
}

fn parse_port(value: &str) -> Option<u16> {
    value.parse::<u16>().ok().filter(|port| *port != 0)
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("timezone", &self.timezone)
            .finish()
    }
}

/// Key/value DSN with the password masked.
impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host={} user={} password=*** dbname={} port={} sslmode=disable TimeZone={}",
            self.host, self.user, self.database, self.port, self.timezone
        )
    }
}

/// Load a `.env` file into the process environment.
///
/// With no explicit path, `.env` is searched for in the working directory and
/// its parents, and a missing file is not an error. An explicit path must
/// exist. Returns the file that was loaded, if any.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)?;
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(e.into()),
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to load .env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
    #[error("Required environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("Invalid environment variable {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
    #[error("Configuration error: {0}")]
    Validation(String),
}
