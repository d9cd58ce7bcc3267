// Queue Store Port (Interface)

use crate::domain::{OperationRecord, QueueSnapshot};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence gateway for named queues.
///
/// The store never holds a live queue, only the snapshots passed in at call time.
/// Every failure of the backing store surfaces as `AppError::StorageUnavailable`.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Create the backing tables if missing (idempotent)
    async fn create_schema_if_absent(&self) -> Result<()>;

    /// Upsert a queue's state keyed by name.
    ///
    /// An existing row only has its items and operation log overwritten.
    async fn save(&self, snapshot: &QueueSnapshot) -> Result<()>;

    /// Load the stored snapshot for `name`
    async fn load(&self, name: &str) -> Result<Option<QueueSnapshot>>;

    /// All persisted queue names
    async fn list_names(&self) -> Result<Vec<String>>;

    /// Remove the queue row and all of its audit rows (absent name is not an error)
    async fn delete(&self, name: &str) -> Result<()>;

    /// Append one operation event to the audit table
    async fn append_operation_audit(&self, name: &str, record: &OperationRecord) -> Result<()>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// In-memory store for tests, with an availability switch
    #[derive(Default)]
    pub struct InMemoryQueueStore {
        rows: Mutex<HashMap<String, QueueSnapshot>>,
        audit: Mutex<Vec<(String, OperationRecord)>>,
        saved_history: Mutex<Vec<QueueSnapshot>>,
        unavailable: AtomicBool,
        failing_names: Mutex<Vec<String>>,
    }

    impl InMemoryQueueStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every call fail with `StorageUnavailable`
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Make `save` fail for one queue name only
        pub fn fail_saves_for(&self, name: impl Into<String>) {
            self.failing_names.lock().unwrap().push(name.into());
        }

        /// Current stored row for `name`
        pub fn row(&self, name: &str) -> Option<QueueSnapshot> {
            self.rows.lock().unwrap().get(name).cloned()
        }

        pub fn insert_row(&self, snapshot: QueueSnapshot) {
            self.rows
                .lock()
                .unwrap()
                .insert(snapshot.name.clone(), snapshot);
        }

        /// Every snapshot passed to `save`, in call order
        pub fn saved_history(&self) -> Vec<QueueSnapshot> {
            self.saved_history.lock().unwrap().clone()
        }

        pub fn audit_entries(&self) -> Vec<(String, OperationRecord)> {
            self.audit.lock().unwrap().clone()
        }

        fn check_available(&self) -> Result<()> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(AppError::StorageUnavailable(
                    "in-memory store switched off".to_string(),
                ));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl QueueStore for InMemoryQueueStore {
        async fn create_schema_if_absent(&self) -> Result<()> {
            self.check_available()
        }

        async fn save(&self, snapshot: &QueueSnapshot) -> Result<()> {
            self.check_available()?;
            if self
                .failing_names
                .lock()
                .unwrap()
                .iter()
                .any(|n| n == &snapshot.name)
            {
                return Err(AppError::StorageUnavailable(format!(
                    "save rejected for {}",
                    snapshot.name
                )));
            }

            self.saved_history.lock().unwrap().push(snapshot.clone());
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&snapshot.name) {
                Some(existing) => {
                    existing.items = snapshot.items.clone();
                    existing.operations_log = snapshot.operations_log.clone();
                }
                None => {
                    rows.insert(snapshot.name.clone(), snapshot.clone());
                }
            }
            Ok(())
        }

        async fn load(&self, name: &str) -> Result<Option<QueueSnapshot>> {
            self.check_available()?;
            Ok(self.row(name))
        }

        async fn list_names(&self) -> Result<Vec<String>> {
            self.check_available()?;
            let mut names: Vec<String> = self.rows.lock().unwrap().keys().cloned().collect();
            names.sort();
            Ok(names)
        }

        async fn delete(&self, name: &str) -> Result<()> {
            self.check_available()?;
            self.rows.lock().unwrap().remove(name);
            self.audit.lock().unwrap().retain(|(n, _)| n != name);
            Ok(())
        }

        async fn append_operation_audit(&self, name: &str, record: &OperationRecord) -> Result<()> {
            self.check_available()?;
            self.audit
                .lock()
                .unwrap()
                .push((name.to_string(), record.clone()));
            Ok(())
        }
    }
}
