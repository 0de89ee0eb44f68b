//! Common validation utilities.

use chrono::{DateTime, Utc};
use validator::ValidationError;

/// Validates that a text field is non-empty after trimming.
pub fn validate_required(label: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(format!("{} is required", label).into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates that a count is strictly positive.
pub fn validate_positive(label: &str, value: i64) -> Result<(), ValidationError> {
    if value > 0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("positive");
        err.message = Some(format!("{} must be greater than 0", label).into());
        Err(err)
    }
}

/// Validates that `later` falls strictly after `earlier`.
pub fn validate_after(
    earlier: DateTime<Utc>,
    later: DateTime<Utc>,
    code: &'static str,
    message: &'static str,
) -> Result<(), ValidationError> {
    if later > earlier {
        Ok(())
    } else {
        let mut err = ValidationError::new(code);
        err.message = Some(message.into());
        Err(err)
    }
}

/// Returns the human readable message of a validation error, falling back to its code.
pub fn error_message(err: &ValidationError) -> String {
    err.message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.code.to_string())
}
