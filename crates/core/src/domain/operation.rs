// Operation Log Records

use serde::{Deserialize, Serialize};

/// Kind of mutation recorded in a queue's operation log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Enqueue,
    Dequeue,
    Clear,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Enqueue => "enqueue",
            OperationType::Dequeue => "dequeue",
            OperationType::Clear => "clear",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enqueue" => Ok(OperationType::Enqueue),
            "dequeue" => Ok(OperationType::Dequeue),
            "clear" => Ok(OperationType::Clear),
            other => Err(format!("unknown operation type: {}", other)),
        }
    }
}

/// One entry of a queue's append-only operation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    #[serde(rename = "type")]
    pub op_type: OperationType,

    /// Item moved by the operation (absent for `clear`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,

    pub timestamp: i64, // epoch ms

    /// Number of items left in the queue after the operation
    #[serde(rename = "queue_size")]
    pub queue_size_after: usize,
}

impl OperationRecord {
    pub fn new(
        op_type: OperationType,
        item: Option<String>,
        timestamp: i64,
        queue_size_after: usize,
    ) -> Self {
        Self {
            op_type,
            item,
            timestamp,
            queue_size_after,
        }
    }
}
