// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Queue '{queue}' is empty")]
    EmptyQueue { queue: String },

    #[error("Queue '{queue}' is full (max size: {max_size})")]
    CapacityExceeded { queue: String, max_size: usize },

    #[error("Max size must be between 1 and {max}, got {0}", max = crate::domain::queue::MAX_CAPACITY)]
    InvalidCapacity(usize),
}

pub type Result<T> = std::result::Result<T, DomainError>;
