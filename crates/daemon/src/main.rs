//! QueueKeeper - Main Entry Point
//! Named FIFO queues over JSON-RPC, persisted to SQLite.

mod config;
mod logging;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use config::DaemonConfig;
use queuekeeper_api_rpc::{RpcServer, RpcServerConfig};
use queuekeeper_core::application::{shutdown_channel, AuditWriter, FlushScheduler, QueueRegistry};
use queuekeeper_core::port::time_provider::SystemTimeProvider;
use queuekeeper_core::port::{QueueStore, TimeProvider};
use queuekeeper_infra_sqlite::{create_pool, SqliteQueueStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration and initialize logging
    let config = DaemonConfig::from_env()?;
    let _log_guard = logging::init_logging(&config)?;

    info!("QueueKeeper v{} starting...", VERSION);

    // 2. Open the database and create the schema
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }
    let db_url = config.db_path.to_string_lossy().into_owned();
    info!(db_path = %db_url, "Initializing database...");

    let pool = create_pool(&db_url)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;

    // 3. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let store = Arc::new(SqliteQueueStore::new(pool, time_provider.clone()));

    let result = serve(&config, store.clone(), time_provider).await;

    // The pool is closed on every exit path
    store.close().await;
    info!("Database closed");

    if let Err(e) = &result {
        error!(error = %e, "QueueKeeper exited with error");
    }
    result
}

async fn serve(
    config: &DaemonConfig,
    store: Arc<SqliteQueueStore>,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<()> {
    store
        .create_schema_if_absent()
        .await
        .map_err(|e| anyhow::anyhow!("Schema creation failed: {}", e))?;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    // 4. Audit writer and registry
    let (audit_sink, audit_handle) = AuditWriter::spawn(store.clone(), shutdown_rx.clone());
    let registry = Arc::new(QueueRegistry::new(store.clone(), time_provider, audit_sink));

    // 5. Restore persisted queues
    match registry.rehydrate().await {
        Ok(count) => info!(restored_queues = count, "Rehydration completed"),
        Err(e) => warn!(error = %e, "Rehydration failed, starting with an empty registry"),
    }

    // 6. Start flush scheduler
    let scheduler = FlushScheduler::new(registry.clone(), config.flush_interval);
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    // 7. Start JSON-RPC server
    let rpc_config = RpcServerConfig {
        host: config.rpc_host.clone(),
        port: config.rpc_port,
    };
    let (rpc_handle, rpc_addr) = match RpcServer::new(rpc_config, registry.clone()).start().await {
        Ok(started) => started,
        Err(e) => {
            // Background tasks still get their final flush and drain
            shutdown_tx.shutdown();
            join_within(scheduler_handle, config.shutdown_timeout).await;
            join_within(audit_handle, config.shutdown_timeout).await;
            return Err(anyhow::anyhow!("RPC server start failed: {}", e));
        }
    };

    info!(addr = %rpc_addr, "System ready");
    info!("Press Ctrl+C to shutdown");

    // 8. Wait for shutdown signal
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }

    info!("Shutdown signal received. Exiting gracefully...");

    // 9. Graceful shutdown: stop accepting requests, then flush and drain
    if let Err(e) = rpc_handle.stop() {
        warn!(error = %e, "RPC server already stopped");
    }
    rpc_handle.stopped().await;
    shutdown_tx.shutdown();

    // Both tasks are finished or cancelled before the pool is closed
    match join_within(scheduler_handle, config.shutdown_timeout).await {
        Some(Ok(report)) if report.is_clean() => {
            info!(saved = report.saved, "All queues saved");
        }
        Some(Ok(report)) => {
            error!(
                saved = report.saved,
                failed = report.failures.len(),
                "Some queues could not be saved at shutdown"
            );
        }
        Some(Err(e)) => error!(error = %e, "Flush scheduler task failed"),
        None => error!(
            timeout_secs = config.shutdown_timeout.as_secs(),
            "Final flush timed out and was cancelled"
        ),
    }

    match join_within(audit_handle, config.shutdown_timeout).await {
        Some(Ok(stats)) => info!(
            written = stats.written,
            failed = stats.failed,
            "Audit writer drained"
        ),
        Some(Err(e)) => error!(error = %e, "Audit writer task failed"),
        None => warn!("Audit writer did not drain before timeout and was cancelled"),
    }

    info!("Shutdown complete.");
    Ok(())
}

/// Await a background task, aborting it once `limit` has passed.
///
/// The task has completed or been dropped when this returns. `None` means it timed out.
async fn join_within<T>(mut handle: JoinHandle<T>, limit: Duration) -> Option<Result<T, JoinError>> {
    match tokio::time::timeout(limit, &mut handle).await {
        Ok(joined) => Some(joined),
        Err(_) => {
            handle.abort();
            let _ = handle.await;
            None
        }
    }
}
