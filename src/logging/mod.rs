//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - console output with configurable level
//! - optional JSON file logging with rotation
//! - macros for the events every submission emits
//!
//! # Example
//!
//! ```no_run
//! use gradeexport::logging::init_logging;
//! use gradeexport::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(course_id = 2, "Report rendered");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a grade submission
///
/// # Example
///
/// ```no_run
/// use gradeexport::log_submission_start;
///
/// log_submission_start!("sample", 2, 15);
/// ```
#[macro_export]
macro_rules! log_submission_start {
    ($driver:expr, $course_id:expr, $count:expr) => {
        tracing::info!(
            driver = %$driver,
            course_id = %$course_id,
            selected = $count,
            "Sending grades"
        );
    };
}

/// Log the end of a grade submission
///
/// # Example
///
/// ```no_run
/// use gradeexport::log_submission_complete;
/// use std::time::Duration;
///
/// log_submission_complete!(14, 1, Duration::from_millis(350));
/// ```
#[macro_export]
macro_rules! log_submission_complete {
    ($sent:expr, $failed:expr, $duration:expr) => {
        tracing::info!(
            sent = $sent,
            failed = $failed,
            duration_ms = $duration.as_millis(),
            "Grade submission finished"
        );
    };
}

/// Log one student whose grade could not be sent
///
/// # Example
///
/// ```no_run
/// use gradeexport::log_student_send_failure;
///
/// log_student_send_failure!(42, "201900123", "Connection refused");
/// ```
#[macro_export]
macro_rules! log_student_send_failure {
    ($user_id:expr, $ident:expr, $error:expr) => {
        tracing::warn!(
            user_id = %$user_id,
            ident = %$ident,
            error = %$error,
            "Failed to send grade"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use gradeexport::log_error_with_context;
/// use gradeexport::domain::GradeExportError;
///
/// let error = GradeExportError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
