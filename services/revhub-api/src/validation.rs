//! Input validation utilities

use crate::handlers::ApiError;

/// Longest identifier accepted for team names, user ids and pull request ids
pub const MAX_ID_LEN: usize = 255;

/// Validate a required identifier field
pub fn validate_id(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }

    if value.len() > MAX_ID_LEN {
        return Err(ApiError::Validation(format!(
            "{field} too long (max {MAX_ID_LEN} bytes, got {})",
            value.len()
        )));
    }

    Ok(())
}

/// Validate a required free-text field
pub fn validate_name(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(())
}
