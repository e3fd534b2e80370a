//! TTL KV - demo process
//!
//! Opens one TTL table over an in-memory store and keeps it pruned until
//! the process is told to stop.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_kv::{BoundedStore, Config, KeyValueStore, MemoryStore, PruneHandle, TtlTable};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the backing store (bounded when `STORE_CAPACITY` > 0)
/// 4. Open the TTL table and start its prune task
/// 5. Wait for SIGINT/SIGTERM, then cancel the prune task and wait for it
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_kv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        table = %config.table_name,
        prune_interval_ms = config.prune_interval_ms,
        store_capacity = config.store_capacity,
        "Configuration loaded"
    );

    let store: Arc<dyn KeyValueStore> = if config.store_capacity > 0 {
        Arc::new(BoundedStore::new(config.store_capacity).context("creating bounded store")?)
    } else {
        Arc::new(MemoryStore::new())
    };

    let (_table, prune_handle) = TtlTable::open(
        store,
        &config.table_name,
        config.prune_interval(),
        CancellationToken::new(),
    )
    .context("opening TTL table")?;
    info!("TTL prune task started");

    shutdown_signal(prune_handle).await;

    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the prune task.
async fn shutdown_signal(prune_handle: PruneHandle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    prune_handle.shutdown().await;
    info!("Prune task stopped");
}
