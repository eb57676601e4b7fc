//! Host platform integration
//!
//! Gradeexport reads courses, enrolments, grades and permissions from the
//! host platform through the traits in [`traits`]. [`memory`] provides a
//! snapshot-backed implementation used by the CLI, the HTTP server and tests.

pub mod memory;
pub mod traits;

pub use memory::{HostSnapshot, InMemoryHost};
pub use traits::{
    capabilities, AttendanceSource, CourseDirectory, EnrollmentService, GradeStore, HostPlatform,
    PermissionService,
};
