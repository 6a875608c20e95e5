//! MusicAmp player (amp-player) - Main entry point
//!
//! Loads configuration, starts the playback engine with the simulated
//! backend, and serves the HTTP/SSE control API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use amp_common::events::EventBus;
use amp_player::api::{self, AppContext};
use amp_player::audio::SimulatedBackend;
use amp_player::config::{PlayerConfig, CONFIG_ENV_VAR};
use amp_player::playback::PlaybackEngine;
use amp_player::PlayerController;
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for amp-player
#[derive(Parser, Debug)]
#[command(name = "amp-player")]
#[command(about = "MusicAmp audio player service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "AMP_PORT")]
    port: Option<u16>,

    /// Path to the TOML config file
    #[arg(short, long, env = "AMP_CONFIG")]
    config: Option<PathBuf>,

    /// Playlist to load at startup (overrides the config file)
    #[arg(long, env = "AMP_PLAYLIST")]
    playlist: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // clap already folded AMP_CONFIG into args.config
    let config_path = amp_common::config::resolve_config_file(args.config.as_deref(), CONFIG_ENV_VAR);
    let config = PlayerConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = args.port.unwrap_or(config.port);
    info!("Starting MusicAmp player on port {}", port);
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using built-in defaults"),
    }

    // Initialize playback engine
    let events = EventBus::new(config.event_capacity);
    let backend = Arc::new(SimulatedBackend::new(config.library.stream_probe_timeout()));
    let engine = PlaybackEngine::new(backend, config.engine.clone(), events);
    let controller = Arc::new(PlayerController::new(engine, config.library.clone()));
    let event_loop = controller.spawn_event_loop();
    info!("Playback engine initialized");

    if let Some(playlist) = args.playlist.or(config.playlist.clone()) {
        match controller.load_playlist(&playlist).await {
            Ok(count) => info!("Loaded {} entries from {}", count, playlist.display()),
            Err(e) => warn!("Could not load startup playlist {}: {}", playlist.display(), e),
        }
    }

    api::run(port, AppContext::new(Arc::clone(&controller)), shutdown_signal())
        .await
        .context("Server error")?;

    // Fade out whatever is still playing before exiting
    match tokio::time::timeout(Duration::from_secs(5), controller.stop()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Stop on shutdown failed: {}", e),
        Err(_) => warn!("Stop on shutdown timed out"),
    }
    event_loop.abort();

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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
