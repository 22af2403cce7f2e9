//! HTTP handlers, grouped by the router that mounts them.
//!
//! Every handler returns `Result<_, ApiError>` so failures render as
//! `{"message": ...}` with the mapped status.

pub mod admin;
pub mod auth;
pub mod blog;
pub mod comments;
pub mod system;

use crate::error::ApiError;

/// Trims a mandatory text field, rejecting blank input with a 400.
pub(crate) fn required_text(value: &str, field: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

/// Trims an optional text field; blank becomes `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
