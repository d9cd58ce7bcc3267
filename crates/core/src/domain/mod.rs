// Domain Layer - Pure business logic and entities

pub mod error;
pub mod operation;
pub mod queue;

// Re-exports
pub use error::DomainError;
pub use operation::{OperationRecord, OperationType};
pub use queue::{NamedQueue, QueueName, QueueSnapshot, MAX_CAPACITY};
