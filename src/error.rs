//! Structured error types for ingestion and occurrence updates.
//!
//! Query operations on the snapshot index never fail; these errors are
//! produced only where a record is validated or mutated.

use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    InvalidRecurrence,

    // State errors
    NotRepeating,
}

/// Structured error carrying a code, a message and the offending field.
#[derive(Debug, Serialize, Error)]
#[error("{message}")]
pub struct IndexError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IndexError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn invalid_recurrence(reason: &str) -> Self {
        Self::new(ErrorCode::InvalidRecurrence, reason).with_field("recurrence")
    }

    pub fn not_repeating(task_id: i64) -> Self {
        Self::new(
            ErrorCode::NotRepeating,
            format!("Task {} does not repeat", task_id),
        )
    }
}

/// Result type for fallible record operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serializes_code_and_field() {
        let err = IndexError::invalid_value("scheduledFor", "not a calendar date")
            .with_details("2025-02-30");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["code"], "INVALID_FIELD_VALUE");
        assert_eq!(value["field"], "scheduledFor");
        assert_eq!(value["details"], "2025-02-30");
        assert_eq!(err.to_string(), "not a calendar date");
    }
}
