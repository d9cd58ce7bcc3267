//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use queuekeeper_core::application::{FlushReport, QueueDetails, QueueSummary};
use serde::{Deserialize, Serialize};

/// Requests addressing one queue by name
/// (queue.dequeue.v1, queue.front.v1, queue.rear.v1, queue.clear.v1,
/// queue.delete.v1, queue.save.v1)
#[derive(Debug, Deserialize)]
pub struct QueueRef {
    pub queue: String,
}

/// queue.create.v1 - Register a new queue
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub queue: String,
    #[serde(default)]
    pub max_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateResponse {
    pub queue: QueueSummary,
}

/// queue.delete.v1
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub queue: String,
    pub deleted: bool,
    /// Set when the stored row could not be removed
    pub warning: Option<String>,
}

/// queue.enqueue.v1 - Append an item at the rear
#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub queue: String,
    pub item: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnqueueResponse {
    pub queue: String,
    pub size: usize,
}

/// queue.dequeue.v1
#[derive(Debug, Clone, Serialize)]
pub struct DequeueResponse {
    pub queue: String,
    pub item: String,
    pub size: usize,
}

/// queue.front.v1 / queue.rear.v1
#[derive(Debug, Clone, Serialize)]
pub struct PeekResponse {
    pub queue: String,
    pub item: String,
}

/// queue.search.v1
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub queue: String,
    pub item: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub queue: String,
    pub item: String,
    /// Front-relative position, absent when not found
    pub index: Option<usize>,
}

/// queue.clear.v1
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub queue: String,
    pub removed: usize,
}

/// queue.show.v1 - Items, size and recent history of one queue
#[derive(Debug, Deserialize)]
pub struct ShowRequest {
    pub queue: String,
    #[serde(default)]
    pub log_limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShowResponse {
    #[serde(flatten)]
    pub details: QueueDetails,
}

/// queue.list.v1
#[derive(Debug, Default, Deserialize)]
pub struct ListRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub queues: Vec<QueueSummary>,
}

/// queue.save.v1
#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    pub queue: String,
    pub saved: bool,
}

/// admin.flush.v1 - Run a flush cycle now
#[derive(Debug, Default, Deserialize)]
pub struct FlushRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    #[serde(flatten)]
    pub report: FlushReport,
}
