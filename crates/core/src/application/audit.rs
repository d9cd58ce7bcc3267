// Audit Writer - best-effort persistence of individual operation events

use crate::application::ShutdownToken;
use crate::domain::OperationRecord;
use crate::port::QueueStore;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One pending audit row
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub queue: String,
    pub record: OperationRecord,
}

/// Counters returned when the writer stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditStats {
    pub written: u64,
    pub failed: u64,
}

enum AuditMessage {
    Append(AuditEntry),
    /// Acknowledged once every message sent before it has been written
    Barrier(oneshot::Sender<()>),
}

/// Sending half held by the registry. Never blocks, never fails the caller.
#[derive(Clone)]
pub struct AuditSink {
    tx: Option<mpsc::UnboundedSender<AuditMessage>>,
}

impl AuditSink {
    /// Sink that drops every entry
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn record(&self, queue: &str, record: OperationRecord) {
        let Some(tx) = &self.tx else {
            return;
        };

        let entry = AuditEntry {
            queue: queue.to_string(),
            record,
        };
        if tx.send(AuditMessage::Append(entry)).is_err() {
            debug!(queue = %queue, "Audit writer stopped, dropping audit entry");
        }
    }

    /// Wait until every entry recorded before this call has reached the store.
    ///
    /// Returns at once when the sink is disabled or the writer has stopped.
    pub async fn settle(&self) {
        let Some(tx) = &self.tx else {
            return;
        };

        let (ack_tx, ack_rx) = oneshot::channel();
        if tx.send(AuditMessage::Barrier(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }
}

/// Background task draining audit entries into the store
pub struct AuditWriter;

impl AuditWriter {
    /// Spawn the writer task.
    ///
    /// On shutdown the channel is closed and already queued entries are still written.
    pub fn spawn(
        store: Arc<dyn QueueStore>,
        shutdown: ShutdownToken,
    ) -> (AuditSink, JoinHandle<AuditStats>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(Self::run(store, rx, shutdown));
        (AuditSink { tx: Some(tx) }, handle)
    }

    async fn run(
        store: Arc<dyn QueueStore>,
        mut rx: mpsc::UnboundedReceiver<AuditMessage>,
        mut shutdown: ShutdownToken,
    ) -> AuditStats {
        let mut stats = AuditStats::default();

        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(message) => Self::handle(store.as_ref(), message, &mut stats).await,
                    None => break,
                },
                _ = shutdown.wait() => {
                    rx.close();
                    while let Some(message) = rx.recv().await {
                        Self::handle(store.as_ref(), message, &mut stats).await;
                    }
                    break;
                }
            }
        }

        info!(
            written = stats.written,
            failed = stats.failed,
            "Audit writer stopped"
        );
        stats
    }

    async fn handle(store: &dyn QueueStore, message: AuditMessage, stats: &mut AuditStats) {
        let entry = match message {
            AuditMessage::Append(entry) => entry,
            AuditMessage::Barrier(ack) => {
                let _ = ack.send(());
                return;
            }
        };

        match store
            .append_operation_audit(&entry.queue, &entry.record)
            .await
        {
            Ok(()) => stats.written += 1,
            Err(e) => {
                stats.failed += 1;
                warn!(
                    queue = %entry.queue,
                    operation = %entry.record.op_type,
                    error = %e,
                    "Failed to append operation audit"
                );
            }
        }
    }
}
