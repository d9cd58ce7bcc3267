// Input validation for registry operations

use crate::application::constants::MAX_QUEUE_NAME_LEN;
use crate::error::{AppError, Result};

/// Queue names must be non-blank and fit the persisted name column.
///
/// Returns the name with surrounding whitespace removed.
pub fn validate_queue_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "Queue name cannot be empty".to_string(),
        ));
    }

    if name.chars().count() > MAX_QUEUE_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Queue name too long (max {} characters)",
            MAX_QUEUE_NAME_LEN
        )));
    }

    Ok(name)
}

/// Items and search terms must be non-empty; returned trimmed
pub fn validate_item(item: &str) -> Result<&str> {
    let item = item.trim();
    if item.is_empty() {
        return Err(AppError::Validation("Item cannot be empty".to_string()));
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_queue_name_empty() {
        let result = validate_queue_name("   ");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_queue_name_too_long() {
        let long_name = "q".repeat(MAX_QUEUE_NAME_LEN + 1);
        let result = validate_queue_name(&long_name);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("too long"));
    }

    #[test]
    fn test_validate_queue_name_valid() {
        assert!(validate_queue_name("orders").is_ok());
        assert!(validate_queue_name(&"q".repeat(MAX_QUEUE_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_validate_item() {
        assert!(validate_item("").is_err());
        assert!(validate_item("\t").is_err());
        assert_eq!(validate_item("parcel-7").unwrap(), "parcel-7");
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(validate_queue_name("  orders ").unwrap(), "orders");
        assert_eq!(validate_item(" a\n").unwrap(), "a");
        // Length is checked after trimming
        let padded = format!(" {} ", "q".repeat(MAX_QUEUE_NAME_LEN));
        assert!(validate_queue_name(&padded).is_ok());
    }
}
