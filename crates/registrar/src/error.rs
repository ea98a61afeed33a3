//! Error types for registrar.
//!
//! This module defines all error types used throughout the registrar crate.
//! Input validation failures and persistence failures share one enum so the
//! front end can report either with a single match.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for registrar operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// An enrollment year was not an integer.
    #[error("enrollment year must be an integer, got '{value}'")]
    InvalidYear {
        /// The text that failed to parse.
        value: String,
    },

    /// A record identifier was not an integer.
    #[error("record id must be a number, got '{value}'")]
    InvalidId {
        /// The text that failed to parse.
        value: String,
    },

    /// A name search was attempted with an empty query.
    #[error("a name is required to search")]
    EmptyQuery,

    /// A required field was left empty.
    #[error("field '{field}' is required")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    // === Storage Errors ===
    /// Failed to read the data file.
    #[error("failed to read data file {path}: {source}")]
    DataRead {
        /// Path to the data file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the data file.
    #[error("failed to write data file {path}: {source}")]
    DataWrite {
        /// Path to the data file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the counter file.
    #[error("failed to write counter file {path}: {source}")]
    CounterWrite {
        /// Path to the counter file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Every identifier has been handed out.
    #[error("no identifiers left after {last}")]
    IdExhausted {
        /// The last identifier handed out.
        last: crate::record::RecordId,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The delimited writer or reader failed.
    #[error("delimited file error: {0}")]
    Csv(#[from] csv::Error),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for registrar operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an invalid year error.
    #[must_use]
    pub fn invalid_year(value: impl Into<String>) -> Self {
        Self::InvalidYear {
            value: value.into(),
        }
    }

    /// Create an invalid id error.
    #[must_use]
    pub fn invalid_id(value: impl Into<String>) -> Self {
        Self::InvalidId {
            value: value.into(),
        }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error was caused by bad user input rather than I/O.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidYear { .. }
                | Self::InvalidId { .. }
                | Self::EmptyQuery
                | Self::MissingField { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::EmptyQuery;
        assert_eq!(err.to_string(), "a name is required to search");

        let err = Error::invalid_year("abc");
        assert_eq!(
            err.to_string(),
            "enrollment year must be an integer, got 'abc'"
        );
    }

    #[test]
    fn test_invalid_id_display() {
        let err = Error::invalid_id("x1");
        assert_eq!(err.to_string(), "record id must be a number, got 'x1'");
    }

    #[test]
    fn test_is_input_error() {
        assert!(Error::EmptyQuery.is_input_error());
        assert!(Error::invalid_year("abc").is_input_error());
        assert!(Error::invalid_id("abc").is_input_error());
        assert!(Error::MissingField { field: "name" }.is_input_error());

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!Error::from(io_err).is_input_error());
    }

    #[test]
    fn test_id_exhausted_is_not_input_error() {
        let err = Error::IdExhausted { last: u64::MAX };
        assert!(!err.is_input_error());
        assert!(err.to_string().contains("18446744073709551615"));
    }

    #[test]
    fn test_missing_field_display() {
        let err = Error::MissingField { field: "contact" };
        assert!(err.to_string().contains("contact"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_data_write_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DataWrite {
            path: PathBuf::from("/readonly/registros.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("/readonly/registros.csv"));
        assert!(msg.contains("access denied"));
    }

    #[test]
    fn test_counter_write_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Error::CounterWrite {
            path: PathBuf::from("/data/ultimo_id.txt"),
            source: io_err,
        };
        assert!(err.to_string().contains("ultimo_id.txt"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("data_file must not be empty");
        assert!(err.to_string().contains("data_file"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }
}
