//! hearth-apps - Micro-app catalog and resolution service
//!
//! Serves the micro-app catalog, per-user visibility queries and the
//! slug resolution gate used by the web front end's app routes.

use anyhow::{Context, Result};
use clap::Parser;
use hearth_apps::{build_admin_router, build_router, register_builtin_apps, AppRegistry, AppState};
use hearth_common::config::TomlConfig;
use hearth_common::logging::init_tracing;
use hearth_common::FlagStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

const DEFAULT_PORT: u16 = 5820;

/// Command-line arguments for hearth-apps
#[derive(Parser, Debug)]
#[command(name = "hearth-apps")]
#[command(about = "Micro-app catalog and resolution service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "HEARTH_APPS_PORT")]
    port: Option<u16>,

    /// Path to TOML configuration file
    #[arg(short, long, env = "HEARTH_APPS_CONFIG")]
    config: Option<PathBuf>,

    /// Loopback port for the operator endpoints (full catalog, flag writes).
    /// Not served when unset.
    #[arg(long, env = "HEARTH_APPS_ADMIN_PORT")]
    admin_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load_or_default("hearth-apps", args.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing("hearth_apps", &config.logging).context("Failed to initialize logging")?;

    info!("Starting Hearth Apps (hearth-apps) v{}", env!("CARGO_PKG_VERSION"));

    let flags = Arc::new(FlagStore::from_map(config.flags.clone()));
    let registry = Arc::new(AppRegistry::new(flags));
    register_builtin_apps(&registry);
    info!("{} micro-app(s) registered", registry.len());

    let state = AppState::new(registry);
    let app = build_router(state.clone());

    let admin = match args.admin_port {
        Some(admin_port) => {
            let admin_addr = SocketAddr::from(([127, 0, 0, 1], admin_port));
            let admin_listener = tokio::net::TcpListener::bind(admin_addr)
                .await
                .with_context(|| format!("Failed to bind admin listener to {}", admin_addr))?;
            info!("hearth-apps admin listening on http://{}", admin_addr);
            let admin_app = build_admin_router(state);
            Some(tokio::spawn(async move {
                axum::serve(admin_listener, admin_app)
                    .with_graceful_shutdown(shutdown_signal())
                    .await
            }))
        }
        None => None,
    };

    let port = args.port.or(config.port).unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("hearth-apps listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(admin) = admin {
        admin
            .await
            .context("Admin server task failed")?
            .context("Admin server error")?;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
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
