//! hearth-sound - Soundscape player service
//!
//! Plays layered ambient mixes on the local output device and exposes
//! start/stop/fade/volume/timer controls over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use hearth_common::config::{resolve_assets_root, TomlConfig};
use hearth_common::logging::init_tracing;
use hearth_sound::api::{build_router, completion_counter, AppContext};
use hearth_sound::audio::{DeviceBackend, LayerBackend, SilentBackend};
use hearth_sound::MixCatalog;
use hearth_sound::SoundscapeEngine;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 5821;

/// Command-line arguments for hearth-sound
#[derive(Parser, Debug)]
#[command(name = "hearth-sound")]
#[command(about = "Layered soundscape player")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "HEARTH_SOUND_PORT")]
    port: Option<u16>,

    /// Path to TOML configuration file
    #[arg(short, long, env = "HEARTH_SOUND_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the soundscape audio assets
    #[arg(long)]
    assets_root: Option<PathBuf>,

    /// Run without an output device (volumes are tracked only)
    #[arg(long)]
    no_audio: bool,

    /// Mix to start immediately
    #[arg(long, value_name = "MIX")]
    play: Option<String>,

    /// Auto-stop after this many minutes
    #[arg(long, value_name = "MINUTES")]
    timer: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load_or_default("hearth-sound", args.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing("hearth_sound", &config.logging).context("Failed to initialize logging")?;

    info!("Starting Hearth Soundscapes (hearth-sound) v{}", env!("CARGO_PKG_VERSION"));

    let catalog = Arc::new(MixCatalog::builtin());
    let assets_root = resolve_assets_root(args.assets_root.as_deref(), &config);
    info!("Assets root: {}", assets_root.display());

    let backend: Arc<dyn LayerBackend> = if args.no_audio {
        info!("Audio output disabled");
        Arc::new(SilentBackend)
    } else {
        match DeviceBackend::new(&assets_root) {
            Ok(device) => {
                let files = catalog.asset_files();
                device.preload(files.iter().map(String::as_str));
                Arc::new(device)
            }
            Err(e) => {
                warn!("Audio output unavailable, continuing silently: {}", e);
                Arc::new(SilentBackend)
            }
        }
    };

    let completed = Arc::new(AtomicU64::new(0));
    let engine = Arc::new(
        SoundscapeEngine::new(
            Arc::clone(&catalog),
            backend,
            config.soundscape.default_volume,
            Some(completion_counter(Arc::clone(&completed))),
        )
        .context("Failed to create playback engine")?,
    );

    if let Some(mix_id) = args.play.as_deref() {
        if catalog.get(mix_id).is_none() {
            warn!("Unknown mix '{}', not starting", mix_id);
        } else {
            engine.start(mix_id);
            engine.fade_in(config.soundscape.start_fade_in_ms);
        }
    }
    if args.timer.is_some() {
        engine.set_timer(args.timer);
    }

    let app = build_router(AppContext::new(
        Arc::clone(&engine),
        completed,
        config.soundscape.clone(),
    ));

    let port = args.port.or(config.port).unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("hearth-sound listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    engine.shutdown();
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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
