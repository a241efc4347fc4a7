//! Unified error type for the task store, preferences and configuration.
//!
//! Validation and not-found errors are reported to the user and abort the
//! operation before anything is changed. I/O and parse errors come from the
//! data directory files.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required field is missing or a task would end up without subtasks.
    #[error("{0}")]
    Validation(String),

    /// The addressed task or subtask no longer exists.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User input that could not be interpreted (dates, minutes, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::not_found("task 42");
        assert_eq!(err.to_string(), "Not found: task 42");

        let err = AppError::validation("Please add at least one subtask.");
        assert_eq!(err.to_string(), "Please add at least one subtask.");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        let err: AppError = io_err.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
