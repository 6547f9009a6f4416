//! clustermapd - The clustermap occupancy service
//!
//! This is the main entry point for the service.
//! It wires together all the components:
//! - Configuration loading and overrides
//! - Source stores and adapters
//! - Exam-mode oracle client
//! - Presence engine and result cache
//! - HTTP server

use anyhow::{Context, Result};
use clap::Parser;
use clustermap_config::{load_config, Settings};
use clustermap_util::default_config_path;
use clustermapd::{build_engine, create_router, AppState, Overrides};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// clustermapd - Live occupancy of a computer cluster
#[derive(Parser, Debug)]
#[command(name = "clustermapd")]
#[command(about = "Live occupancy of a computer cluster", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/clustermap/config.toml)
    #[arg(short, long, env = "CLUSTERMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address override, e.g. 0.0.0.0:3000
    #[arg(short, long, env = "CLUSTERMAP_LISTEN")]
    listen: Option<String>,

    /// Exam-mode oracle base URL override (empty to disable)
    #[arg(long, env = "CLUSTERMAP_ORACLE_URL")]
    oracle_url: Option<String>,

    /// Bearer token for the exam-mode oracle
    #[arg(long, env = "CLUSTERMAP_ORACLE_TOKEN", hide_env_values = true)]
    oracle_token: Option<String>,

    /// Cluster database (seat sessions and host health) override
    #[arg(long, env = "CLUSTERMAP_CLUSTER_DB")]
    cluster_db: Option<PathBuf>,

    /// Exam database override
    #[arg(long, env = "CLUSTERMAP_EXAM_DB")]
    exam_db: Option<PathBuf>,

    /// Domain appended to short hostnames (empty to disable)
    #[arg(long, env = "CLUSTERMAP_DOMAIN")]
    domain: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            listen: self.listen.clone(),
            oracle_url: self.oracle_url.clone(),
            oracle_token: self.oracle_token.clone(),
            cluster_db: self.cluster_db.clone(),
            exam_db: self.exam_db.clone(),
            domain: self.domain.clone(),
        }
    }
}

/// Load the configuration file, falling back to defaults when the default
/// path does not exist. An explicitly requested file must load.
fn load_settings(args: &Args) -> Result<Settings> {
    let (path, explicit) = match &args.config {
        Some(path) => (path.clone(), true),
        None => (default_config_path(), false),
    };

    let mut settings = if explicit || path.exists() {
        let settings = load_config(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))?;
        info!(config_path = %path.display(), "Configuration loaded");
        settings
    } else {
        info!(config_path = %path.display(), "No configuration file, using defaults");
        Settings::default()
    };

    args.overrides()
        .apply(&mut settings)
        .context("Invalid command-line override")?;

    Ok(settings)
}

async fn shutdown_signal() {
    let sigterm = signal(SignalKind::terminate());
    let sigint = signal(SignalKind::interrupt());

    match (sigterm, sigint) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
            }
        }
        _ => {
            tracing::warn!("Failed to install signal handlers, falling back to Ctrl-C");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "clustermapd starting"
    );

    let settings = load_settings(&args)?;
    let engine = build_engine(&settings)?;
    let router = create_router(AppState::new(engine), &settings.server.base_path);

    let listener = TcpListener::bind(settings.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.listen))?;

    info!(
        listen = %settings.server.listen,
        base_path = %settings.server.base_path,
        "Service running"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shutdown complete");
    Ok(())
}
