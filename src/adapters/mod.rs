//! External system integrations for gradeexport.
//!
//! - [`host`] - the learning platform the grades come from (courses,
//!   enrolments, grades, permissions)
//! - [`drivers`] - external grading systems the grades are sent to
//!
//! Both sides are trait-based so the export logic can run against the
//! in-memory host and stub drivers in tests.

pub mod drivers;
pub mod host;
