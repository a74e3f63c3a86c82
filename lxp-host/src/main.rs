//! lxp-host - SCORM package hosting service
//!
//! Serves uploaded course packages under `/scorm-packages`, each with a
//! generated launcher page, and records learner progress in memory.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lxp_common::config::{
    config_file_path, load_toml_config, log_config_source, ConfigOverrides, HostConfig,
};
use lxp_common::InMemoryProgressStore;
use lxp_host::api::health::BuildInfo;
use lxp_host::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for lxp-host
#[derive(Parser, Debug)]
#[command(name = "lxp-host")]
#[command(about = "SCORM package hosting and progress tracking service")]
#[command(version)]
struct Args {
    /// TOML config file (default: $LXP_CONFIG, then ./lxp.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "LXP_BIND")]
    bind: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Directory holding extracted courses
    #[arg(long, env = "LXP_STORAGE_ROOT")]
    storage_root: Option<PathBuf>,

    /// Directory for uploads awaiting extraction
    #[arg(long, env = "LXP_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Directory levels cleared on re-upload (0 = top-level files only)
    #[arg(long, env = "LXP_CLEANUP_DEPTH")]
    cleanup_depth: Option<u32>,

    /// User id the launcher uses when no userId query parameter is given
    #[arg(long, env = "LXP_DEFAULT_USER")]
    default_user: Option<String>,

    /// Maximum accepted upload size in bytes
    #[arg(long)]
    max_upload_bytes: Option<usize>,

    /// Log level when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind: self.bind,
            port: self.port,
            storage_root: self.storage_root.clone(),
            temp_dir: self.temp_dir.clone(),
            cleanup_depth: self.cleanup_depth,
            default_user_id: self.default_user.clone(),
            max_upload_bytes: self.max_upload_bytes,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts because it carries the log level
    let config_path = config_file_path(args.config.as_deref());
    let toml = load_toml_config(&config_path)?;
    let config = HostConfig::resolve(&args.overrides(), toml.as_ref());

    let default_filter = format!("lxp_host={0},lxp_common={0},tower_http={0}", config.log_level);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let build = BuildInfo::current();
    info!(
        "Starting lxp-host v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        build.git_hash,
        build.timestamp,
        build.profile
    );
    log_config_source(&config_path, toml.as_ref());

    config.validate()?;

    std::fs::create_dir_all(&config.storage_root).with_context(|| {
        format!("Failed to create storage root {}", config.storage_root.display())
    })?;
    std::fs::create_dir_all(&config.temp_dir)
        .with_context(|| format!("Failed to create temp dir {}", config.temp_dir.display()))?;

    info!("Storage root: {}", config.storage_root.display());
    info!("Temp uploads: {}", config.temp_dir.display());
    info!("Re-upload cleanup depth: {}", config.cleanup_depth);
    info!("Progress store: in-memory (not persisted)");

    let addr = config.socket_addr();
    let state = AppState::new(config, Arc::new(InMemoryProgressStore::new()));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("lxp-host listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
