//! Result type alias for gradeexport
//!
//! Provides a Result type alias that uses [`GradeExportError`] as the error type.

use super::errors::GradeExportError;

/// Result type alias for gradeexport operations
///
/// # Examples
///
/// ```
/// use gradeexport::domain::result::Result;
/// use gradeexport::domain::errors::GradeExportError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(GradeExportError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, GradeExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(GradeExportError::Validation("test error".to_string()));
        assert!(result.is_err());
    }
}
