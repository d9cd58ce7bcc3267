//! Shared setup for SQLite-backed integration tests

#![allow(dead_code)]

use queuekeeper_core::application::{AuditSink, QueueRegistry};
use queuekeeper_core::port::time_provider::mocks::SteppingTimeProvider;
use queuekeeper_core::port::time_provider::SystemTimeProvider;
use queuekeeper_core::port::{QueueStore, TimeProvider};
use queuekeeper_infra_sqlite::{create_pool, SqliteQueueStore};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

/// Database file living in a temporary directory
pub struct TestDb {
    _dir: TempDir,
    pub url: String,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = dir.path().join("queues.db").to_string_lossy().into_owned();
        Self { _dir: dir, url }
    }

    /// Open a fresh pool on the file and create the schema
    pub async fn open(&self) -> (SqlitePool, Arc<SqliteQueueStore>) {
        self.open_with_clock(Arc::new(SystemTimeProvider)).await
    }

    pub async fn open_with_clock(
        &self,
        time_provider: Arc<dyn TimeProvider>,
    ) -> (SqlitePool, Arc<SqliteQueueStore>) {
        let pool = create_pool(&self.url).await.unwrap();
        let store = Arc::new(SqliteQueueStore::new(pool.clone(), time_provider));
        store.create_schema_if_absent().await.unwrap();
        (pool, store)
    }
}

pub fn registry(store: Arc<SqliteQueueStore>, audit: AuditSink) -> Arc<QueueRegistry> {
    Arc::new(QueueRegistry::new(
        store,
        Arc::new(SteppingTimeProvider::new(1_000, 1)),
        audit,
    ))
}

pub async fn audit_rows(pool: &SqlitePool, queue: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM queue_operations WHERE queue_name = ?")
        .bind(queue)
        .fetch_one(pool)
        .await
        .unwrap()
}
