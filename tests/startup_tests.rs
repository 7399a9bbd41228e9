//! Startup must fail before listening when credentials are missing or the
//! database cannot be reached.
//!
//! Kept in its own test binary because it edits the process environment; the
//! tests that do so serialize on `ENV_LOCK`.

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use aims_backend::config::{
    load_env_file, AppConfig, ConfigError, ConnectionConfig, DatabaseSettings, ENV_DB_HOST,
    ENV_DB_NAME, ENV_DB_PASSWORD, ENV_DB_PORT, ENV_DB_USER, REQUIRED_DB_ENV,
};
use aims_backend::database::ConnectionError;
use aims_backend::{app, AppError};
use tokio::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::const_new(());

fn set_valid_env() {
    std::env::set_var(ENV_DB_HOST, "127.0.0.1");
    std::env::set_var(ENV_DB_USER, "aims");
    std::env::set_var(ENV_DB_PASSWORD, "aims");
    std::env::set_var(ENV_DB_NAME, "aims_db");
    std::env::set_var(ENV_DB_PORT, "5432");
}

fn clear_env() {
    for name in REQUIRED_DB_ENV {
        std::env::remove_var(name);
    }
}

/// A local port with nothing listening on it.
fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn local_config(port: u16) -> AppConfig {
    let mut config = AppConfig::default();
    config.http.host = "127.0.0.1".to_string();
    config.http.port = port;
    config
}

#[tokio::test]
async fn test_missing_env_var_prevents_startup() {
    let _guard = ENV_LOCK.lock().await;
    set_valid_env();
    std::env::remove_var(ENV_DB_NAME);

    let port = free_port();
    let result = tokio::time::timeout(Duration::from_secs(5), app::run(local_config(port)))
        .await
        .expect("run should fail immediately");

    match result {
        Err(AppError::Config(ConfigError::MissingVar(name))) => assert_eq!(name, ENV_DB_NAME),
        other => panic!("expected missing {}, got {:?}", ENV_DB_NAME, other),
    }
    assert!(TcpStream::connect(("127.0.0.1", port)).is_err());
}

#[tokio::test]
async fn test_unreachable_database_prevents_serving() {
    let _guard = ENV_LOCK.lock().await;
    set_valid_env();
    // Nothing listens on port 1
    std::env::set_var(ENV_DB_PORT, "1");

    let port = free_port();
    let result = tokio::time::timeout(Duration::from_secs(5), app::run(local_config(port)))
        .await
        .expect("refused connection should fail without waiting for the timeout");

    match result {
        Err(AppError::Connection(ConnectionError::Connect { port: 1, .. })) => {}
        other => panic!("expected connection failure, got {:?}", other),
    }
    assert!(
        TcpStream::connect(("127.0.0.1", port)).is_err(),
        "server must not be listening"
    );
}

#[tokio::test]
async fn test_invalid_listen_host_fails_before_connecting() {
    let mut config = AppConfig::default();
    config.http.host = "localhost.invalid".to_string();

    let result = app::run(config).await;
    assert!(matches!(result, Err(AppError::Server(_))));
}

#[tokio::test]
async fn test_env_file_supplies_database_variables() {
    let _guard = ENV_LOCK.lock().await;
    clear_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "DB_HOST=db.from.file\nDB_USER=aims\nDB_PASSWORD=from-file\nDB_NAME=aims_db\nDB_PORT=6543"
    )
    .unwrap();

    let loaded = load_env_file(Some(file.path())).unwrap();
    assert_eq!(loaded.as_deref(), Some(file.path()));

    let config = ConnectionConfig::from_env(&DatabaseSettings::default()).unwrap();
    assert_eq!(config.host, "db.from.file");
    assert_eq!(config.password, "from-file");
    assert_eq!(config.database, "aims_db");
    assert_eq!(config.port, 6543);
}

#[tokio::test]
async fn test_process_env_wins_over_env_file() {
    let _guard = ENV_LOCK.lock().await;
    clear_env();
    std::env::set_var(ENV_DB_HOST, "db.from.process");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "DB_HOST=db.from.file").unwrap();
    load_env_file(Some(file.path())).unwrap();

    assert_eq!(std::env::var(ENV_DB_HOST).unwrap(), "db.from.process");
}

#[test]
fn test_explicit_missing_env_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_env_file(Some(&dir.path().join("absent.env")));
    assert!(matches!(result, Err(ConfigError::EnvFile(_))));
}
