//! Playlist daemon (juked-pd) - main entry point
//!
//! Boots the playlist registry from the SQLite store, serves the control
//! API, and coordinates two-phase shutdown of the running control loops.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use juked_common::config::Settings;
use juked_pd::{api, PlaylistRegistry, ShutdownCoordinator};

/// Command-line arguments for juked-pd
#[derive(Parser, Debug)]
#[command(name = "juked-pd")]
#[command(about = "Playlist playback daemon for juked")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "JUKED_PORT")]
    port: Option<u16>,

    /// Path to the SQLite database
    #[arg(short, long, env = "JUKED_DB")]
    database: Option<PathBuf>,

    /// Seconds to wait for control loops to drain on shutdown
    #[arg(short, long, env = "JUKED_GRACE_PERIOD")]
    grace_period: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "juked_pd=debug,juked_common=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments and resolve settings
    let args = Args::parse();
    let settings = Settings::resolve(args.port, args.database, args.grace_period);

    info!("Starting juked playlist daemon on port {}", settings.port);
    info!("Database: {}", settings.database.display());

    // Open the store and make sure the schema exists
    if let Some(parent) = settings.database.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    let pool = juked_common::db::connect(&settings.database)
        .await
        .context("Failed to open database")?;
    juked_common::db::init_schema(&pool)
        .await
        .context("Failed to initialize schema")?;

    // Construct the registry and hydrate it from the store
    let registry = Arc::new(PlaylistRegistry::new(pool));
    registry.load().await.context("Failed to hydrate registry")?;

    // Build the application router
    let state = api::AppState {
        registry: Arc::clone(&registry),
        port: settings.port,
    };
    let app = api::create_router(state);

    // Create and run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // HTTP is down; drain the control loops, bounded by the grace period
    let (cancel, tracker) = registry.shutdown_handle();
    let forced = ShutdownCoordinator::new(
        cancel,
        tracker,
        Duration::from_secs(settings.grace_period_secs),
    )
    .run()
    .await;

    info!(forced, "shutdown complete");
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
