//! Error context extension trait
//!
//! Provides `.context()` and `.with_context()` for `Result<T, GradeExportError>`,
//! similar to `anyhow::Context` but keeping the domain error type.
//!
//! # Examples
//!
//! ```rust
//! use gradeexport::domain::Result;
//! use gradeexport::domain::context::ResultExt;
//!
//! fn read_snapshot(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_context(|| format!("Failed to read host snapshot: {}", path))
//! }
//! ```

use crate::domain::errors::GradeExportError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error (evaluated eagerly)
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error using a closure (evaluated only on error)
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<GradeExportError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| wrap(context, e.into()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(f(), e.into()))
    }
}

// Configuration errors keep their variant so callers can still map them to exit code 2
fn wrap(context: impl std::fmt::Display, base: GradeExportError) -> GradeExportError {
    match base {
        GradeExportError::Configuration(msg) => {
            GradeExportError::Configuration(format!("{context}: {msg}"))
        }
        other => GradeExportError::Other(format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ExternalSystemError;

    #[test]
    fn test_context_with_error() {
        let result: Result<()> = Err(GradeExportError::Host("enrolment table missing".to_string()));
        let err = result.context("Failed to load students").unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Failed to load students"));
        assert!(msg.contains("enrolment table missing"));
    }

    #[test]
    fn test_configuration_variant_preserved() {
        let result: Result<()> = Err(GradeExportError::Configuration("bad port".to_string()));
        let err = result.context("Failed to load gradeexport.toml").unwrap_err();
        assert!(matches!(err, GradeExportError::Configuration(_)));
        assert!(err.to_string().contains("bad port"));
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let called = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let called_clone = called.clone();

        let result: Result<i32> = Ok(42);
        let with_context = result.with_context(|| {
            called_clone.store(true, std::sync::atomic::Ordering::SeqCst);
            "Expensive context"
        });

        assert!(with_context.is_ok());
        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_context_with_external_error() {
        let result: std::result::Result<(), ExternalSystemError> =
            Err(ExternalSystemError::Timeout("30s".to_string()));
        let err = result.context("Failed to send grade for u1").unwrap_err();
        assert!(err.to_string().contains("Failed to send grade for u1"));
        assert!(err.to_string().contains("30s"));
    }
}
