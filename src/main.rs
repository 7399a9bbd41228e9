//! AIMS backend entry point.
//!
//! Parses arguments, loads `.env` and configuration, initializes tracing, then hands off to
//! [`aims_backend::app::run`]. Any startup failure is logged and turns into a
//! non-zero exit code before the server starts listening.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aims_backend::app;
use aims_backend::config::{load_env_file, AppConfig, LogFormat, DEFAULT_LOG_FILTER};

/// AIMS backend: health-checked database service
#[derive(Parser, Debug)]
#[command(name = "aims-backend", version, about)]
struct Args {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// Path to a .env file (default: search for .env from the working directory)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Log level filter (e.g., "aims_backend=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

fn init_tracing(log_filter: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(EnvFilter::new(log_filter));
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Tracing is not up yet, so these errors go straight to stderr
    let env_file = match load_env_file(args.env_file.as_deref()) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("aims-backend: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match AppConfig::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("aims-backend: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    init_tracing(&log_filter, config.logging.format);

    match &env_file {
        Some(path) => tracing::info!(path = %path.display(), "Loaded environment file"),
        None => tracing::debug!("No .env file found, using process environment only"),
    }

    tracing::info!(
        config = args.config.as_deref().unwrap_or("<defaults>"),
        http_host = %config.http.host,
        http_port = config.http.port,
        "Loaded configuration"
    );

    match app::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}
