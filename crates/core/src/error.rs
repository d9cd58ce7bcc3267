// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Queue already exists: {0}")]
    DuplicateName(String),

    #[error("Unknown queue: {0}")]
    UnknownQueue(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// True for failures of the backing store (retried by the next flush cycle)
    pub fn is_storage(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in the infra-sqlite crate
// by mapping to AppError::StorageUnavailable(String)
