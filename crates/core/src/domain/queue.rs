// Named Queue Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::operation::{OperationRecord, OperationType};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Queue identifier
pub type QueueName = String;

/// Largest accepted `max_size`; bounds are persisted as signed 64-bit integers
pub const MAX_CAPACITY: usize = i64::MAX as usize;

/// Point-in-time copy of a queue, consistent between `items` and `operations_log`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub name: QueueName,
    pub max_size: Option<usize>,
    pub created_at: i64, // epoch ms
    /// Front first, rear last
    pub items: Vec<String>,
    pub operations_log: Vec<OperationRecord>,
}

/// FIFO container with an optional capacity bound and an append-only operation log.
///
/// Every call that changes `items` appends exactly one matching record to the log
/// in the same step. The log is history only and is never replayed.
#[derive(Debug, Clone)]
pub struct NamedQueue {
    name: QueueName,
    max_size: Option<usize>,
    items: VecDeque<String>,
    operations_log: Vec<OperationRecord>,
    created_at: i64,
}

impl NamedQueue {
    /// Create an empty queue
    ///
    /// # Arguments
    ///
    /// * `name` - Unique queue name (immutable afterwards)
    /// * `max_size` - Capacity bound, `None` for unbounded
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(name: impl Into<String>, max_size: Option<usize>, created_at: i64) -> Result<Self> {
        if let Some(max) = max_size {
            if max == 0 || max > MAX_CAPACITY {
                return Err(DomainError::InvalidCapacity(max));
            }
        }

        Ok(Self {
            name: name.into(),
            max_size,
            items: VecDeque::new(),
            operations_log: Vec::new(),
            created_at,
        })
    }

    /// Rebuild a queue verbatim from a stored snapshot (no replay)
    pub fn restore(snapshot: QueueSnapshot) -> Self {
        Self {
            name: snapshot.name,
            max_size: snapshot.max_size,
            items: snapshot.items.into(),
            operations_log: snapshot.operations_log,
            created_at: snapshot.created_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn operations_log(&self) -> &[OperationRecord] {
        &self.operations_log
    }

    /// Append `item` at the rear
    pub fn enqueue(&mut self, item: impl Into<String>, now_millis: i64) -> Result<OperationRecord> {
        if let Some(max_size) = self.max_size {
            if self.items.len() >= max_size {
                return Err(DomainError::CapacityExceeded {
                    queue: self.name.clone(),
                    max_size,
                });
            }
        }

        let item = item.into();
        self.items.push_back(item.clone());
        Ok(self.record(OperationType::Enqueue, Some(item), now_millis))
    }

    /// Remove and return the front item with its log record
    pub fn dequeue(&mut self, now_millis: i64) -> Result<(String, OperationRecord)> {
        let item = self.items.pop_front().ok_or_else(|| self.empty_error())?;
        let record = self.record(OperationType::Dequeue, Some(item.clone()), now_millis);
        Ok((item, record))
    }

    pub fn front(&self) -> Result<&str> {
        self.items
            .front()
            .map(String::as_str)
            .ok_or_else(|| self.empty_error())
    }

    pub fn rear(&self) -> Result<&str> {
        self.items
            .back()
            .map(String::as_str)
            .ok_or_else(|| self.empty_error())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// Remove every item. Succeeds on an already empty queue and still logs.
    pub fn clear(&mut self, now_millis: i64) -> OperationRecord {
        self.items.clear();
        self.record(OperationType::Clear, None, now_millis)
    }

    /// Copy of the items, front first
    pub fn to_list(&self) -> Vec<String> {
        self.items.iter().cloned().collect()
    }

    /// 0-based index from the front of the first exact match
    pub fn search(&self, item: &str) -> Option<usize> {
        self.items.iter().position(|candidate| candidate == item)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            name: self.name.clone(),
            max_size: self.max_size,
            created_at: self.created_at,
            items: self.to_list(),
            operations_log: self.operations_log.clone(),
        }
    }

    fn record(
        &mut self,
        op_type: OperationType,
        item: Option<String>,
        now_millis: i64,
    ) -> OperationRecord {
        let record = OperationRecord::new(op_type, item, now_millis, self.items.len());
        self.operations_log.push(record.clone());
        record
    }

    fn empty_error(&self) -> DomainError {
        DomainError::EmptyQueue {
            queue: self.name.clone(),
        }
    }
}
