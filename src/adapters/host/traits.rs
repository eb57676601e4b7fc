//! Host platform abstraction traits
//!
//! The host platform owns courses, enrolments, grades and permissions.
//! Gradeexport only reads from it, through the narrow interfaces below.

use crate::domain::ids::{CourseId, GroupId, UserId};
use crate::domain::{Course, GradeItem, Group, HostUser, LocalGrade, Result};
use async_trait::async_trait;
use std::collections::HashMap;

/// Capability names checked against the host permission service
pub mod capabilities {
    /// Base capability to export grades out of a course
    pub const EXPORT: &str = "grade:export";

    /// View the grades report of this exporter
    pub const VIEW: &str = "gradeexport:view";

    /// Send grades to the external system
    pub const PUBLISH: &str = "gradeexport:publish";

    /// See every group of a course, not only the user's own
    pub const ACCESS_ALL_GROUPS: &str = "site:accessallgroups";
}

/// Enrolment lookups
#[async_trait]
pub trait EnrollmentService: Send + Sync {
    /// Fetch the students enrolled in a course, optionally restricted to a group
    ///
    /// # Errors
    ///
    /// Returns an error if the course does not exist.
    async fn fetch_enrolled(
        &self,
        course: CourseId,
        group: Option<GroupId>,
        active_only: bool,
    ) -> Result<Vec<HostUser>>;
}

/// Read-only access to persisted grades
#[async_trait]
pub trait GradeStore: Send + Sync {
    /// Fetch the final grade item of a course
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::GradeExportError::NotFound`] if the course has
    /// no final grade item.
    async fn fetch_course_grade_item(&self, course: CourseId) -> Result<GradeItem>;

    /// Fetch final grades of an item, keyed by user
    ///
    /// `None` fetches every grade of the item; `Some` restricts the fetch to
    /// the given users (an empty slice fetches nothing).
    async fn fetch_grades(
        &self,
        item: &GradeItem,
        user_ids: Option<&[UserId]>,
    ) -> Result<HashMap<UserId, LocalGrade>>;
}

/// Capability checks
#[async_trait]
pub trait PermissionService: Send + Sync {
    async fn has_capability(&self, capability: &str, course: CourseId, user: UserId)
        -> Result<bool>;
}

/// Courses, meta links and groups
#[async_trait]
pub trait CourseDirectory: Send + Sync {
    async fn fetch_course(&self, course: CourseId) -> Result<Course>;

    /// Courses whose students are pulled into `course` through a meta link
    async fn affiliated_courses(&self, course: CourseId) -> Result<Vec<Course>>;

    /// Grouping courses that pull `course` in through a meta link
    async fn parent_courses(&self, course: CourseId) -> Result<Vec<Course>>;

    async fn course_groups(&self, course: CourseId) -> Result<Vec<Group>>;

    /// Groups of `course` the user is a member of
    async fn user_groups(&self, course: CourseId, user: UserId) -> Result<Vec<Group>>;
}

/// Attendance rates recorded by the host
#[async_trait]
pub trait AttendanceSource: Send + Sync {
    /// Attendance rate in `[0, 1]` per user
    async fn fetch_attendance(&self, course: CourseId) -> Result<HashMap<UserId, f64>>;
}

/// Everything an export session needs from the host platform
pub trait HostPlatform:
    EnrollmentService + GradeStore + PermissionService + CourseDirectory + AttendanceSource
{
}

impl<T> HostPlatform for T where
    T: EnrollmentService + GradeStore + PermissionService + CourseDirectory + AttendanceSource
{
}
