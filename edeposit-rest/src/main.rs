//! edeposit-rest - Main entry point
//!
//! HTTP front door of the e-deposit system: authenticated clients submit
//! publications and query the status of their deposits.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use edeposit_common::config::{resolve_root_folder, RootFolder, TomlConfig, ROOT_FOLDER_ENV};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edeposit_rest::{build_router, AppState};

/// Command-line arguments for edeposit-rest
#[derive(Parser, Debug)]
#[command(name = "edeposit-rest")]
#[command(about = "E-deposit submission and status service")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "EDEPOSIT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "EDEPOSIT_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "EDEPOSIT_PORT")]
    port: Option<u16>,

    /// Root folder holding the database and cached artifacts
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("edeposit_rest={level},edeposit_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting edeposit-rest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root = RootFolder::new(resolve_root_folder(
        args.root_folder.as_deref(),
        ROOT_FOLDER_ENV,
        config.root_folder.as_deref(),
    ));
    root.ensure_directory_exists()
        .with_context(|| format!("Failed to create root folder {}", root.path().display()))?;
    info!("Root folder: {}", root.path().display());

    let db_path = config
        .database_path
        .clone()
        .unwrap_or_else(|| root.database_path());
    info!("Database: {}", db_path.display());

    let pool = edeposit_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::from_pool(pool.clone(), root.artifacts_path(), config.max_upload_bytes);
    let app = build_router(state);

    let host = args.host.unwrap_or(config.host);
    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
