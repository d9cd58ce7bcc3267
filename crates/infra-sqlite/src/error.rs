// sqlx / serde_json error mapping

use queuekeeper_core::error::AppError;

/// Convert sqlx::Error to AppError::StorageUnavailable with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    let message = match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            Some(code) => match code.as_ref() {
                "2067" | "1555" => format!(
                    "Unique constraint violation: {} ({})",
                    db_err.message(),
                    code
                ),
                "5" | "6" => format!("Database locked: {}", db_err.message()),
                "13" => format!("Database full: {}", db_err.message()),
                other => format!("Database error [{}]: {}", other, db_err.message()),
            },
            None => format!("Database error: {}", db_err.message()),
        },
        sqlx::Error::PoolTimedOut => "Connection pool timed out".to_string(),
        sqlx::Error::PoolClosed => "Connection pool closed".to_string(),
        sqlx::Error::ColumnNotFound(col) => format!("Column not found: {}", col),
        // Connection, io, protocol errors
        _ => err.to_string(),
    };
    AppError::StorageUnavailable(message)
}

/// A stored JSON column that no longer decodes is a store-layer failure
pub(crate) fn map_json_error(queue: &str, column: &str, err: serde_json::Error) -> AppError {
    AppError::StorageUnavailable(format!(
        "Corrupt {} column for queue {}: {}",
        column, queue, err
    ))
}
