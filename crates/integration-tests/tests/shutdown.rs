//! Background tasks at shutdown: final flush and audit drain

mod common;

use common::{audit_rows, registry, TestDb};
use queuekeeper_core::application::{shutdown_channel, AuditSink, AuditWriter, FlushScheduler};
use queuekeeper_core::port::QueueStore;
use std::time::Duration;

#[tokio::test]
async fn test_final_flush_reaches_sqlite() {
    let db = TestDb::new();
    let (_, store) = db.open().await;
    let registry = registry(store.clone(), AuditSink::disabled());
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    // Period long enough that only the final flush runs
    let scheduler = FlushScheduler::new(registry.clone(), Duration::from_secs(3600));
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    registry.create_queue("orders", None).await.unwrap();
    registry.enqueue("orders", "last-minute").await.unwrap();
    assert!(store.load("orders").await.unwrap().is_none());

    shutdown_tx.shutdown();
    let report = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.saved, 1);
    let stored = store.load("orders").await.unwrap().unwrap();
    assert_eq!(stored.items, vec!["last-minute"]);
}

#[tokio::test]
async fn test_audit_writer_drains_into_sqlite() {
    let db = TestDb::new();
    let (pool, store) = db.open().await;
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let (sink, audit_handle) = AuditWriter::spawn(store.clone(), shutdown_rx);
    let registry = registry(store, sink);

    registry.create_queue("orders", None).await.unwrap();
    for i in 0..25 {
        registry.enqueue("orders", &format!("o{}", i)).await.unwrap();
    }
    registry.clear("orders").await.unwrap();

    shutdown_tx.shutdown();
    let stats = audit_handle.await.unwrap();
    assert_eq!(stats.written, 26);
    assert_eq!(stats.failed, 0);
    assert_eq!(audit_rows(&pool, "orders").await, 26);

    let (op, item, size): (String, Option<String>, i64) = sqlx::query_as(
        "SELECT operation_type, item_value, queue_size FROM queue_operations ORDER BY id DESC LIMIT 1",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(op, "clear");
    assert_eq!(item, None);
    assert_eq!(size, 0);
}

#[tokio::test]
async fn test_audit_failures_do_not_fail_operations() {
    let db = TestDb::new();
    let (pool, store) = db.open().await;
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let (sink, audit_handle) = AuditWriter::spawn(store.clone(), shutdown_rx);
    let registry = registry(store, sink);

    registry.create_queue("orders", None).await.unwrap();
    pool.close().await;

    assert_eq!(registry.enqueue("orders", "a").await.unwrap(), 1);
    assert_eq!(registry.dequeue("orders").await.unwrap().item, "a");

    shutdown_tx.shutdown();
    let stats = audit_handle.await.unwrap();
    assert_eq!(stats.written, 0);
    assert_eq!(stats.failed, 2);
}
