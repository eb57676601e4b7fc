//! Domain error types
//!
//! This module defines the error hierarchy for gradeexport. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main gradeexport error type
///
/// This is the primary error type used throughout the library. Configuration
/// mistakes in a driver (missing mandatory field, missing field handler,
/// undeclared action) are fatal for the request that hit them.
#[derive(Debug, Error)]
pub enum GradeExportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A driver field mapping lacks one of the mandatory fields
    #[error("'{0}' is a required field and it's not defined at the driver")]
    MandatoryField(String),

    /// A driver-sourced field has no registered data handler
    #[error("Field '{field}' is sourced by driver '{driver}' but no data handler is registered")]
    MissingFieldHandler { field: String, driver: String },

    /// The requested action is not declared by the selected driver
    #[error("The driver action '{0}' is unknown.")]
    UnknownAction(String),

    /// The acting user is not allowed to perform the operation
    #[error("Permission denied: {0}")]
    Permission(String),

    /// A course, user or grade item could not be found in the host platform
    #[error("Not found: {0}")]
    NotFound(String),

    /// External grading system errors
    #[error("External system error: {0}")]
    ExternalSystem(#[from] ExternalSystemError),

    /// Host platform errors
    #[error("Host platform error: {0}")]
    Host(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl GradeExportError {
    /// Whether the error indicates a broken driver or configuration rather than
    /// a runtime failure
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GradeExportError::Configuration(_)
                | GradeExportError::MandatoryField(_)
                | GradeExportError::MissingFieldHandler { .. }
                | GradeExportError::UnknownAction(_)
        )
    }
}

/// External grading system errors
///
/// Errors that occur when talking to the system grades are exported to.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum ExternalSystemError {
    /// Failed to connect to the external system
    #[error("Failed to connect to external system: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid response from server
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for GradeExportError {
    fn from(err: std::io::Error) -> Self {
        GradeExportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for GradeExportError {
    fn from(err: serde_json::Error) -> Self {
        GradeExportError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for GradeExportError {
    fn from(err: toml::de::Error) -> Self {
        GradeExportError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from csv writer errors
impl From<csv::Error> for GradeExportError {
    fn from(err: csv::Error) -> Self {
        GradeExportError::Serialization(format!("CSV error: {err}"))
    }
}
