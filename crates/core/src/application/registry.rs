// Queue Registry - owns every live named queue and routes operations by name

use crate::application::audit::AuditSink;
use crate::application::constants::DEFAULT_LOG_TAIL;
use crate::application::flush::{FlushFailure, FlushReport};
use crate::application::validation::{validate_item, validate_queue_name};
use crate::domain::{NamedQueue, OperationRecord};
use crate::error::{AppError, Result};
use crate::port::{QueueStore, TimeProvider};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

/// Registered queue with its locks.
///
/// `queue` serializes mutations and snapshot reads. `persist` serializes store writes
/// for this queue so a flush can never re-save a queue that `delete_queue` removed.
/// Lock order is always `persist` before `queue`.
///
/// `retired` is set by `delete_queue` while holding both locks. Mutations check it
/// under `queue`, store writes check it under `persist`.
struct QueueEntry {
    name: String,
    queue: Mutex<NamedQueue>,
    persist: Mutex<()>,
    retired: AtomicBool,
}

impl QueueEntry {
    fn new(queue: NamedQueue) -> Arc<Self> {
        Arc::new(Self {
            name: queue.name().to_string(),
            queue: Mutex::new(queue),
            persist: Mutex::new(()),
            retired: AtomicBool::new(false),
        })
    }

    fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    /// Lock the queue for a mutation; a deleted entry behaves as an unknown queue
    async fn lock_live(&self) -> Result<MutexGuard<'_, NamedQueue>> {
        let queue = self.queue.lock().await;
        if self.is_retired() {
            return Err(AppError::UnknownQueue(self.name.clone()));
        }
        Ok(queue)
    }
}

/// Short listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub name: String,
    pub size: usize,
    pub max_size: Option<usize>,
    pub created_at: i64,
}

/// Full view of one queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueDetails {
    pub name: String,
    pub size: usize,
    pub max_size: Option<usize>,
    pub is_empty: bool,
    pub created_at: i64,
    pub items: Vec<String>,
    pub recent_operations: Vec<OperationRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DequeueOutcome {
    pub item: String,
    pub size: usize,
}

/// Result of `delete_queue`. The in-memory removal always happens;
/// `store_warning` is set when the persisted row could not be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub name: String,
    pub store_warning: Option<String>,
}

pub struct QueueRegistry {
    queues: RwLock<HashMap<String, Arc<QueueEntry>>>,
    store: Arc<dyn QueueStore>,
    time_provider: Arc<dyn TimeProvider>,
    audit: AuditSink,
}

impl QueueRegistry {
    pub fn new(
        store: Arc<dyn QueueStore>,
        time_provider: Arc<dyn TimeProvider>,
        audit: AuditSink,
    ) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            store,
            time_provider,
            audit,
        }
    }

    /// Register a new empty queue. Persisted by the next flush or an explicit save.
    pub async fn create_queue(&self, name: &str, max_size: Option<usize>) -> Result<QueueSummary> {
        let name = validate_queue_name(name)?;

        let mut queues = self.queues.write().await;
        if queues.contains_key(name) {
            return Err(AppError::DuplicateName(name.to_string()));
        }

        let queue = NamedQueue::new(name, max_size, self.time_provider.now_millis())?;
        let summary = summarize(&queue);
        queues.insert(name.to_string(), QueueEntry::new(queue));

        info!(queue = %name, max_size = ?max_size, "Queue created");
        Ok(summary)
    }

    /// Remove a queue from memory, then its row and audit history from the store.
    ///
    /// Audit entries already recorded for the queue are written before the rows are
    /// removed. A store failure is reported in the outcome; the queue stays deleted
    /// in memory.
    pub async fn delete_queue(&self, name: &str) -> Result<DeleteOutcome> {
        let name = name.trim();
        let entry = self
            .queues
            .write()
            .await
            .remove(name)
            .ok_or_else(|| AppError::UnknownQueue(name.to_string()))?;

        let _persist = entry.persist.lock().await;
        {
            // Waits out an in-flight mutation; later ones see the flag and fail
            let _queue = entry.queue.lock().await;
            entry.retired.store(true, Ordering::Release);
        }
        self.audit.settle().await;

        let store_warning = match self.store.delete(name).await {
            Ok(()) => None,
            Err(e) => {
                warn!(queue = %name, error = %e, "Queue deleted in memory but its stored row remains");
                Some(e.to_string())
            }
        };

        info!(queue = %name, "Queue deleted");
        Ok(DeleteOutcome {
            name: name.to_string(),
            store_warning,
        })
    }

    /// Returns the queue size after the enqueue
    pub async fn enqueue(&self, name: &str, item: &str) -> Result<usize> {
        let item = validate_item(item)?;
        let entry = self.entry(name).await?;

        // Audit entries are sent under the queue lock to keep their order
        let size = {
            let mut queue = entry.lock_live().await?;
            let record = queue.enqueue(item, self.time_provider.now_millis())?;
            let size = record.queue_size_after;
            self.audit.record(&entry.name, record);
            size
        };

        debug!(queue = %name, size, "Item enqueued");
        Ok(size)
    }

    pub async fn dequeue(&self, name: &str) -> Result<DequeueOutcome> {
        let entry = self.entry(name).await?;

        let (item, size) = {
            let mut queue = entry.lock_live().await?;
            let (item, record) = queue.dequeue(self.time_provider.now_millis())?;
            let size = record.queue_size_after;
            self.audit.record(&entry.name, record);
            (item, size)
        };

        debug!(queue = %name, size, "Item dequeued");
        Ok(DequeueOutcome { item, size })
    }

    pub async fn front(&self, name: &str) -> Result<String> {
        let entry = self.entry(name).await?;
        let queue = entry.queue.lock().await;
        let item = queue.front()?.to_string();
        Ok(item)
    }

    pub async fn rear(&self, name: &str) -> Result<String> {
        let entry = self.entry(name).await?;
        let queue = entry.queue.lock().await;
        let item = queue.rear()?.to_string();
        Ok(item)
    }

    /// Front-relative index of the first match, `None` when absent
    pub async fn search(&self, name: &str, item: &str) -> Result<Option<usize>> {
        let item = validate_item(item)?;
        let entry = self.entry(name).await?;
        let queue = entry.queue.lock().await;
        Ok(queue.search(item))
    }

    /// Returns the number of items removed
    pub async fn clear(&self, name: &str) -> Result<usize> {
        let entry = self.entry(name).await?;

        let removed = {
            let mut queue = entry.lock_live().await?;
            let removed = queue.size();
            let record = queue.clear(self.time_provider.now_millis());
            self.audit.record(&entry.name, record);
            removed
        };

        info!(queue = %name, removed, "Queue cleared");
        Ok(removed)
    }

    pub async fn size(&self, name: &str) -> Result<usize> {
        let entry = self.entry(name).await?;
        let size = entry.queue.lock().await.size();
        Ok(size)
    }

    pub async fn is_empty(&self, name: &str) -> Result<bool> {
        let entry = self.entry(name).await?;
        let empty = entry.queue.lock().await.is_empty();
        Ok(empty)
    }

    pub async fn to_list(&self, name: &str) -> Result<Vec<String>> {
        let entry = self.entry(name).await?;
        let items = entry.queue.lock().await.to_list();
        Ok(items)
    }

    /// Newest `limit` log records, oldest first
    pub async fn operations_log(&self, name: &str, limit: usize) -> Result<Vec<OperationRecord>> {
        let entry = self.entry(name).await?;
        let queue = entry.queue.lock().await;
        Ok(log_tail(queue.operations_log(), limit))
    }

    pub async fn describe(&self, name: &str, log_limit: Option<usize>) -> Result<QueueDetails> {
        let entry = self.entry(name).await?;
        let queue = entry.queue.lock().await;

        Ok(QueueDetails {
            name: queue.name().to_string(),
            size: queue.size(),
            max_size: queue.max_size(),
            is_empty: queue.is_empty(),
            created_at: queue.created_at(),
            items: queue.to_list(),
            recent_operations: log_tail(
                queue.operations_log(),
                log_limit.unwrap_or(DEFAULT_LOG_TAIL),
            ),
        })
    }

    /// Every registered queue, sorted by name
    pub async fn list_queues(&self) -> Vec<QueueSummary> {
        let mut summaries = Vec::new();
        for entry in self.entries().await {
            summaries.push(summarize(&*entry.queue.lock().await));
        }
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.queues.read().await.contains_key(name.trim())
    }

    /// Persist one queue now, surfacing store failures to the caller
    pub async fn save_queue(&self, name: &str) -> Result<()> {
        let entry = self.entry(name).await?;
        self.persist(&entry).await?;
        info!(queue = %name, "Queue saved");
        Ok(())
    }

    /// Persist a snapshot of every registered queue.
    ///
    /// Queues are visited one at a time; each queue lock is held only for the copy.
    /// A failed save is recorded and the cycle moves on to the next queue.
    pub async fn flush_all(&self) -> FlushReport {
        let mut report = FlushReport::default();

        for entry in self.entries().await {
            report.attempted += 1;
            match self.persist(&entry).await {
                Ok(true) => report.saved += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(queue = %entry.name, error = %e, "Flush failed for queue");
                    report.failures.push(FlushFailure {
                        queue: entry.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        debug!(
            attempted = report.attempted,
            saved = report.saved,
            failed = report.failures.len(),
            "Flush cycle finished"
        );
        report
    }

    /// Load every persisted queue into the registry, verbatim.
    ///
    /// Names already registered are left untouched. A snapshot that fails to load is
    /// logged and skipped. Returns how many queues were restored.
    pub async fn rehydrate(&self) -> Result<usize> {
        let names = self.store.list_names().await?;
        let mut restored = 0;

        for name in names {
            if self.contains(&name).await {
                debug!(queue = %name, "Queue already registered, skipping rehydrate");
                continue;
            }

            let snapshot = match self.store.load(&name).await {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => continue,
                Err(e) => {
                    warn!(queue = %name, error = %e, "Failed to load stored queue");
                    continue;
                }
            };

            let queue = NamedQueue::restore(snapshot);
            let size = queue.size();
            let mut queues = self.queues.write().await;
            if queues.contains_key(&name) {
                continue;
            }
            queues.insert(name.clone(), QueueEntry::new(queue));
            restored += 1;
            info!(queue = %name, size, "Queue rehydrated");
        }

        Ok(restored)
    }

    async fn entry(&self, name: &str) -> Result<Arc<QueueEntry>> {
        self.queues
            .read()
            .await
            .get(name.trim())
            .cloned()
            .ok_or_else(|| AppError::UnknownQueue(name.trim().to_string()))
    }

    async fn entries(&self) -> Vec<Arc<QueueEntry>> {
        self.queues.read().await.values().cloned().collect()
    }

    /// Returns `false` when the entry was deleted and must not be written
    async fn persist(&self, entry: &QueueEntry) -> Result<bool> {
        let _persist = entry.persist.lock().await;
        if entry.is_retired() {
            return Ok(false);
        }

        let snapshot = entry.queue.lock().await.snapshot();
        self.store.save(&snapshot).await?;
        Ok(true)
    }
}

fn summarize(queue: &NamedQueue) -> QueueSummary {
    QueueSummary {
        name: queue.name().to_string(),
        size: queue.size(),
        max_size: queue.max_size(),
        created_at: queue.created_at(),
    }
}

fn log_tail(log: &[OperationRecord], limit: usize) -> Vec<OperationRecord> {
    let start = log.len().saturating_sub(limit);
    log[start..].to_vec()
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
