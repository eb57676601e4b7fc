//! Domain models and types for gradeexport.
//!
//! This module contains the core domain models, types, and business rules:
//! courses and request context, enrolled students and external records,
//! local grades, the driver field mapping and the messages produced while
//! reconciling local and external data.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`CourseId`], [`UserId`], [`GroupId`], [`ExternalId`])
//! - **Domain models** ([`Course`], [`EnrolledStudent`], [`ExternalRecord`], [`LocalGrade`])
//! - **Field mapping** ([`FieldMapping`], [`MergedFieldMapping`])
//! - **Error types** ([`GradeExportError`], [`ExternalSystemError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers are newtypes so a user id cannot be passed where a course id
//! is expected:
//!
//! ```rust
//! use gradeexport::domain::{CourseId, ExternalId, UserId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let course = CourseId::new(2)?;
//! let user = UserId::new(7)?;
//! let ident = ExternalId::new("2025001234")?;
//!
//! // let wrong: CourseId = user;  // Compile error!
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod course;
pub mod errors;
pub mod field;
pub mod grade;
pub mod ids;
pub mod message;
pub mod result;
pub mod strings;
pub mod student;

// Re-export commonly used types for convenience
pub use context::ResultExt;
pub use course::{Course, Group, RequestContext, StudentOrder};
pub use errors::{ExternalSystemError, GradeExportError};
pub use field::{
    Alignment, FieldMapping, FieldSource, FieldSpec, FieldValue, MergedField, MergedFieldMapping,
    ValueType,
};
pub use grade::{GradeItem, GradeType, LocalGrade};
pub use ids::{CourseId, ExternalId, GroupId, UserId};
pub use message::{MessageSeverity, Notification, NotificationKind, ReconciliationMessage};
pub use result::Result;
pub use student::{EnrolledStudent, ExternalRecord, ExternalRecords, HostUser, UserIdentField};
