//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes. Each named failure keeps its own code.

use jsonrpsee::types::ErrorObjectOwned;
use queuekeeper_core::domain::DomainError;
use queuekeeper_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const UNKNOWN_QUEUE: i32 = 4001;
    pub const DUPLICATE_NAME: i32 = 4002;
    pub const EMPTY_QUEUE: i32 = 4004;
    pub const CAPACITY_EXCEEDED: i32 = 4005;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const STORAGE_UNAVAILABLE: i32 = 5001;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let code = match &err {
        AppError::Validation(_) => code::VALIDATION_ERROR,
        AppError::UnknownQueue(_) => code::UNKNOWN_QUEUE,
        AppError::DuplicateName(_) => code::DUPLICATE_NAME,
        AppError::Domain(DomainError::EmptyQueue { .. }) => code::EMPTY_QUEUE,
        AppError::Domain(DomainError::CapacityExceeded { .. }) => code::CAPACITY_EXCEEDED,
        AppError::Domain(DomainError::InvalidCapacity(_)) => code::VALIDATION_ERROR,
        AppError::StorageUnavailable(_) => code::STORAGE_UNAVAILABLE,
        AppError::Config(_) => code::INTERNAL_ERROR,
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_errors_keep_distinct_codes() {
        let cases = [
            (AppError::UnknownQueue("q".into()), code::UNKNOWN_QUEUE),
            (AppError::DuplicateName("q".into()), code::DUPLICATE_NAME),
            (
                AppError::Domain(DomainError::EmptyQueue { queue: "q".into() }),
                code::EMPTY_QUEUE,
            ),
            (
                AppError::Domain(DomainError::CapacityExceeded {
                    queue: "q".into(),
                    max_size: 2,
                }),
                code::CAPACITY_EXCEEDED,
            ),
            (
                AppError::StorageUnavailable("down".into()),
                code::STORAGE_UNAVAILABLE,
            ),
            (AppError::Validation("bad".into()), code::VALIDATION_ERROR),
            (
                AppError::Domain(DomainError::InvalidCapacity(0)),
                code::VALIDATION_ERROR,
            ),
            (AppError::Config("bad".into()), code::INTERNAL_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(to_rpc_error(err).code(), expected);
        }
    }

    #[test]
    fn test_message_names_the_queue() {
        let err = to_rpc_error(AppError::Domain(DomainError::CapacityExceeded {
            queue: "orders".into(),
            max_size: 2,
        }));
        assert_eq!(err.message(), "Queue 'orders' is full (max size: 2)");
    }
}
