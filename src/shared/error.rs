//! Error taxonomy for the calculator hub
//!
//! Every error is handled at the boundary closest to where it originates
//! (input parsing, storage access, route resolution). All variants are
//! serializable so the widget layer can render them as quiet UI states.

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the conversion engine
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum ConversionError {
    /// Quantity is not a finite number (NaN, infinity, unparsable text)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unit key is not part of the active category's table
    #[error("Unknown unit '{unit}' for {category}")]
    UnknownUnit { unit: String, category: String },
}

/// Errors raised by the key-value storage backends
#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum StorageError {
    /// Backend could not be opened or accessed (quota, privacy mode, I/O)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Stored value could not be decoded
    #[error("Corrupt stored value for '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

#[derive(Error, Debug, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("I/O Error: {0}")]
    Io(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Calculation Error: {0}")]
    Calculation(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}

impl AppError {
    /// True when the error stems from user input rather than wiring or I/O
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            AppError::Conversion(ConversionError::InvalidInput(_)) | AppError::Validation(_)
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("Serialization error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_serializes_tagged() {
        let err = ConversionError::InvalidInput("abc".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "InvalidInput");
        assert_eq!(json["message"], "abc");
    }

    #[test]
    fn test_invalid_input_classification() {
        let err: AppError = ConversionError::InvalidInput("NaN".to_string()).into();
        assert!(err.is_invalid_input());

        let err: AppError = ConversionError::UnknownUnit {
            unit: "parsec".to_string(),
            category: "length".to_string(),
        }
        .into();
        assert!(!err.is_invalid_input());
        assert_eq!(err.to_string(), "Unknown unit 'parsec' for length");
    }
}
