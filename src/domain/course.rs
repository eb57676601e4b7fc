//! Course, group and request context types

use super::ids::{CourseId, GroupId, UserId};
use serde::{Deserialize, Serialize};

/// Host platform course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,

    pub shortname: String,

    pub fullname: String,

    /// Institutional course code; drivers use it to recognise courses they handle
    #[serde(default)]
    pub idnumber: String,
}

/// Host platform group inside a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub course_id: CourseId,
    pub name: String,
}

/// Order in which enrolled students are listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentOrder {
    /// First name, last name, then identifier
    FullName,
    /// External identifier
    UserIdent,
    /// Last name, then first name
    #[default]
    Default,
}

impl StudentOrder {
    /// Parses the `orderby` request parameter; unknown values use the default order
    pub fn from_param(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "fullname" => StudentOrder::FullName,
            "userident" => StudentOrder::UserIdent,
            _ => StudentOrder::Default,
        }
    }

    /// Value of the `orderby` request parameter, `None` for the default order
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            StudentOrder::FullName => Some("fullname"),
            StudentOrder::UserIdent => Some("userident"),
            StudentOrder::Default => None,
        }
    }
}

/// Explicit context every export operation runs in
///
/// When grades are exported for an affiliated course, `course` is the
/// affiliated course (students come from there) and `parent` is the grouping
/// course that owns the final grade item.
///
/// # Example
///
/// ```
/// use gradeexport::domain::course::{Course, RequestContext, StudentOrder};
/// use gradeexport::domain::ids::{CourseId, UserId};
///
/// let course = Course {
///     id: CourseId::new(2).unwrap(),
///     shortname: "MAT101".to_string(),
///     fullname: "Calculus I".to_string(),
///     idnumber: "MAT101-2025".to_string(),
/// };
/// let ctx = RequestContext::new(course, UserId::new(7).unwrap())
///     .with_order(StudentOrder::FullName);
/// assert_eq!(ctx.grade_course().id.get(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub course: Course,

    /// Grouping course with a meta link pointing to `course`
    pub parent: Option<Course>,

    /// The user sending grades
    pub user: UserId,

    /// Selected group; `None` means all participants
    pub group: Option<GroupId>,

    pub order: StudentOrder,

    /// Only list students with an active enrolment
    pub active_only: bool,
}

impl RequestContext {
    pub fn new(course: Course, user: UserId) -> Self {
        Self {
            course,
            parent: None,
            user,
            group: None,
            order: StudentOrder::Default,
            active_only: false,
        }
    }

    pub fn with_parent(mut self, parent: Option<Course>) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_group(mut self, group: Option<GroupId>) -> Self {
        self.group = group;
        self
    }

    pub fn with_order(mut self, order: StudentOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }

    /// Course owning the final grade item
    pub fn grade_course(&self) -> &Course {
        self.parent.as_ref().unwrap_or(&self.course)
    }
}
