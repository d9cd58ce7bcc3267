// SQLite QueueStore Implementation

use crate::error::{map_json_error, map_sqlx_error};
use crate::migration::run_migrations;
use async_trait::async_trait;
use queuekeeper_core::domain::{OperationRecord, QueueSnapshot};
use queuekeeper_core::error::{AppError, Result};
use queuekeeper_core::port::{QueueStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

pub struct SqliteQueueStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteQueueStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    /// Close the pool, waiting for checked-out connections to be returned
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn create_schema_if_absent(&self) -> Result<()> {
        run_migrations(&self.pool).await
    }

    async fn save(&self, snapshot: &QueueSnapshot) -> Result<()> {
        let items = serde_json::to_string(&snapshot.items)
            .map_err(|e| map_json_error(&snapshot.name, "items", e))?;
        let operations_log = serde_json::to_string(&snapshot.operations_log)
            .map_err(|e| map_json_error(&snapshot.name, "operations_log", e))?;
        let max_size = snapshot
            .max_size
            .map(i64::try_from)
            .transpose()
            .map_err(|_| {
                AppError::Validation(format!(
                    "Max size of queue {} does not fit the store",
                    snapshot.name
                ))
            })?;

        // Existing rows keep their max_size and created_at
        sqlx::query(
            r#"
            INSERT INTO queues (name, max_size, created_at, items, operations_log, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                items = excluded.items,
                operations_log = excluded.operations_log,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&snapshot.name)
        .bind(max_size)
        .bind(snapshot.created_at)
        .bind(&items)
        .bind(&operations_log)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(
            queue = %snapshot.name,
            size = snapshot.items.len(),
            log_len = snapshot.operations_log.len(),
            "Queue snapshot saved"
        );
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<QueueSnapshot>> {
        let row = sqlx::query_as::<_, QueueRow>(
            "SELECT name, max_size, created_at, items, operations_log FROM queues WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(QueueRow::into_snapshot).transpose()
    }

    async fn list_names(&self) -> Result<Vec<String>> {
        sqlx::query_scalar("SELECT name FROM queues ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM queues WHERE name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM queue_operations WHERE queue_name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn append_operation_audit(&self, name: &str, record: &OperationRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queue_operations (queue_name, operation_type, item_value, timestamp, queue_size)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(record.op_type.as_str())
        .bind(&record.item)
        .bind(record.timestamp)
        .bind(record.queue_size_after as i64)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

/// SQLite row representation of Table A
#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    name: String,
    max_size: Option<i64>,
    created_at: i64,
    items: String,
    operations_log: String,
}

impl QueueRow {
    fn into_snapshot(self) -> Result<QueueSnapshot> {
        let items: Vec<String> =
            serde_json::from_str(&self.items).map_err(|e| map_json_error(&self.name, "items", e))?;
        let operations_log: Vec<OperationRecord> = serde_json::from_str(&self.operations_log)
            .map_err(|e| map_json_error(&self.name, "operations_log", e))?;

        let max_size = self
            .max_size
            .map(usize::try_from)
            .transpose()
            .map_err(|_| {
                AppError::StorageUnavailable(format!(
                    "Corrupt max_size column for queue {}: {:?}",
                    self.name, self.max_size
                ))
            })?;

        Ok(QueueSnapshot {
            max_size,
            name: self.name,
            created_at: self.created_at,
            items,
            operations_log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;
    use queuekeeper_core::domain::{NamedQueue, OperationType, MAX_CAPACITY};
    use queuekeeper_core::port::time_provider::SystemTimeProvider;

    async fn setup_test_db() -> (SqlitePool, SqliteQueueStore) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let store = SqliteQueueStore::new(pool.clone(), Arc::new(SystemTimeProvider));
        store.create_schema_if_absent().await.unwrap();
        (pool, store)
    }

    fn sample_queue() -> NamedQueue {
        let mut queue = NamedQueue::new("orders", Some(4), 1_000).unwrap();
        queue.enqueue("a", 1_001).unwrap();
        queue.enqueue("b", 1_002).unwrap();
        queue.enqueue("c", 1_003).unwrap();
        queue.dequeue(1_004).unwrap();
        queue
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let (_, store) = setup_test_db().await;
        let snapshot = sample_queue().snapshot();

        store.save(&snapshot).await.unwrap();
        let loaded = store.load("orders").await.unwrap().unwrap();

        assert_eq!(loaded, snapshot);
        let restored = NamedQueue::restore(loaded);
        assert_eq!(restored.to_list(), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_largest_capacity_round_trips() {
        let (_, store) = setup_test_db().await;
        let queue = NamedQueue::new("huge", Some(MAX_CAPACITY), 1).unwrap();

        store.save(&queue.snapshot()).await.unwrap();
        let loaded = store.load("huge").await.unwrap().unwrap();
        assert_eq!(loaded.max_size, Some(MAX_CAPACITY));
    }

    #[tokio::test]
    async fn test_oversized_capacity_is_rejected_not_wrapped() {
        let (_, store) = setup_test_db().await;
        let mut snapshot = NamedQueue::new("huge", None, 1).unwrap().snapshot();
        snapshot.max_size = Some(usize::MAX);

        let err = store.save(&snapshot).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.load("huge").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_negative_stored_capacity_is_corrupt() {
        let (pool, store) = setup_test_db().await;
        sqlx::query(
            "INSERT INTO queues (name, max_size, created_at, items, operations_log, updated_at) VALUES ('bad', -5, 1, '[]', '[]', 1)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = store.load("bad").await.unwrap_err();
        assert!(err.to_string().contains("Corrupt max_size"));
    }

    #[tokio::test]
    async fn test_load_missing() {
        let (_, store) = setup_test_db().await;
        assert!(store.load("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_upserts_without_duplicates() {
        let (pool, store) = setup_test_db().await;
        let mut queue = sample_queue();
        store.save(&queue.snapshot()).await.unwrap();

        queue.clear(2_000);
        let mut second = queue.snapshot();
        // Only items and log may change on an existing row
        second.max_size = Some(99);
        second.created_at = 5;
        store.save(&second).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queues WHERE name = 'orders'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let loaded = store.load("orders").await.unwrap().unwrap();
        assert!(loaded.items.is_empty());
        assert_eq!(loaded.operations_log.len(), 5);
        assert_eq!(loaded.max_size, Some(4));
        assert_eq!(loaded.created_at, 1_000);
    }

    #[tokio::test]
    async fn test_list_names() {
        let (_, store) = setup_test_db().await;
        for name in ["beta", "alpha"] {
            let queue = NamedQueue::new(name, None, 1).unwrap();
            store.save(&queue.snapshot()).await.unwrap();
        }

        assert_eq!(store.list_names().await.unwrap(), vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_audit() {
        let (pool, store) = setup_test_db().await;
        let mut queue = NamedQueue::new("orders", None, 1).unwrap();
        let record = queue.enqueue("a", 2).unwrap();
        store.save(&queue.snapshot()).await.unwrap();
        store.append_operation_audit("orders", &record).await.unwrap();
        store.append_operation_audit("other", &record).await.unwrap();

        store.delete("orders").await.unwrap();

        assert!(store.load("orders").await.unwrap().is_none());
        let audit: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queue_operations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(audit, 1);

        // Deleting an absent name is not an error
        assert!(store.delete("orders").await.is_ok());
    }

    #[tokio::test]
    async fn test_append_operation_audit() {
        let (pool, store) = setup_test_db().await;
        let clear = OperationRecord::new(OperationType::Clear, None, 77, 0);
        store.append_operation_audit("orders", &clear).await.unwrap();

        let (op, item, ts, size): (String, Option<String>, i64, i64) = sqlx::query_as(
            "SELECT operation_type, item_value, timestamp, queue_size FROM queue_operations",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(op, "clear");
        assert_eq!(item, None);
        assert_eq!(ts, 77);
        assert_eq!(size, 0);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_storage_error() {
        let (pool, store) = setup_test_db().await;
        sqlx::query(
            "INSERT INTO queues (name, created_at, items, operations_log, updated_at) VALUES ('bad', 1, 'not json', '[]', 1)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = store.load("bad").await.unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().contains("Corrupt items"));
    }

    #[tokio::test]
    async fn test_closed_pool_is_storage_unavailable() {
        let (_, store) = setup_test_db().await;
        store.close().await;

        let err = store.list_names().await.unwrap_err();
        assert!(err.is_storage());
    }
}
