//! mediabox - main entry point
//!
//! Wires the collaborators together, builds the action table and serves the
//! HTTP API until Ctrl-C or SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediabox_common::events::PlaybackEvent;
use mediabox_server::actions::Dispatcher;
use mediabox_server::api::{self, AppState, HttpOptions};
use mediabox_server::bluetooth::BluezCtl;
use mediabox_server::config::{Args, Config};
use mediabox_server::playback::{Player, RemoteFetcher};
use mediabox_server::sse::{forward_playback_events, ClientRegistry, EventBus};
use mediabox_server::system::Systemctl;
use mediabox_server::{catalog, db, AppContext, AppPaths};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediabox=info,mediabox_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "mediabox v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = Config::load(&args).context("Failed to load configuration")?;
    info!("Database: {}", config.database_path.display());
    info!("Media root: {}", config.media_root.display());

    // Live updates
    let clients = ClientRegistry::new(config.heartbeat_interval, config.client_buffer);
    let bus = EventBus::new(Arc::clone(&clients));
    let (playback_tx, playback_rx) = mpsc::unbounded_channel();
    let bridge = forward_playback_events(bus.clone(), playback_rx);

    // Collaborators
    let player = start_player(&config, playback_tx).await?;
    let library = db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let context = AppContext {
        bus: bus.clone(),
        player: Arc::clone(&player),
        fetcher: Arc::new(RemoteFetcher::new(config.download_dir.clone())),
        library: library.clone(),
        bluetooth: Arc::new(BluezCtl::new(
            config.bluetooth_adapter.clone(),
            config.pin_file.clone(),
        )),
        services: Arc::new(Systemctl::new()),
        paths: Arc::new(AppPaths {
            views_dir: config.views_dir.clone(),
            media_root: config.media_root.clone(),
            log_dir: config.log_dir.clone(),
            artwork_dir: config.artwork_dir.clone(),
        }),
    };

    let registry = catalog::build_registry().context("Failed to build action table")?;
    info!("Registered {} API actions", registry.len());
    let dispatcher = Arc::new(Dispatcher::new(registry, context, config.action_timeouts));

    let app = api::build_router(AppState { dispatcher, bus }, &HttpOptions::from(&config));
    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr()))?;

    let shutdown_clients = Arc::clone(&clients);
    api::serve(listener, app, async move {
        shutdown_signal().await;
        // Open event streams would otherwise hold graceful shutdown forever
        shutdown_clients.disconnect_all();
    })
    .await
    .context("Server error")?;

    if let Err(e) = player.quit().await {
        warn!("Error stopping player: {}", e);
    }
    library.close().await;
    bridge.abort();

    info!("Shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn start_player(
    config: &Config,
    events: mpsc::UnboundedSender<PlaybackEvent>,
) -> Result<Arc<dyn Player>> {
    use mediabox_server::playback::mpv::{MpvOptions, MpvPlayer};

    let options = MpvOptions {
        binary: config.mpv_binary.clone(),
        socket_path: config.mpv_socket.clone(),
        ..MpvOptions::default()
    };
    let player = MpvPlayer::spawn(&options, events)
        .await
        .context("Failed to start audio player")?;
    info!("Audio player ready");
    Ok(Arc::new(player))
}

#[cfg(not(unix))]
async fn start_player(
    _config: &Config,
    _events: mpsc::UnboundedSender<PlaybackEvent>,
) -> Result<Arc<dyn Player>> {
    anyhow::bail!("The mpv audio player requires a Unix platform")
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
