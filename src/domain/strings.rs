//! User-facing string catalog
//!
//! Every message and notification carries a stable code plus the English text
//! looked up here. Parametrised strings have dedicated formatting helpers.

/// Stable message and notification codes
pub mod codes {
    pub const SEND_ZERO: &str = "send_zero";
    pub const GRADES_DIFFER: &str = "grades_differ";
    pub const GRADE_SENT: &str = "grade_sent";
    pub const SEND_FAILED: &str = "send_failed";
    pub const NOT_EXTERNAL: &str = "notexternal";
    pub const NOT_LOCAL: &str = "notlocal";

    pub const CANNOT_SEND_GRADES: &str = "cannot_send_grades";
    pub const CANNOT_VIEW_GRADES: &str = "cannot_view_grades";
    pub const CANNOT_ACCESS_GROUPS: &str = "cannot_access_groups";
    pub const CANNOT_EXPORT: &str = "cannot_export";
    pub const INVALID_TYPE_VALUE: &str = "invalid_type_value";
    pub const INVALID_GRADE_RANGE: &str = "invalid_grade_range";
    pub const SENTGRADES_SUCCESS: &str = "sentgrades_success";
    pub const SENTGRADES_ERROR: &str = "sentgrades_error";
    pub const NO_SELECTED_STUDENTS: &str = "no_selected_students";
    pub const VISIT_GROUPED_COURSES: &str = "visit_grouped_courses";
    pub const GROUPED_COURSE: &str = "grouped_course";
}

pub const TITLE_HEADER: &str = "Export grades to an external system";
pub const REMARKS: &str = "Remarks";
pub const EXTERNAL: &str = "External";
pub const LOCAL: &str = "Local";
pub const SEND: &str = "Send";
pub const SEND_GRADES: &str = "Send selected grades";
pub const ALL_PARTICIPANTS: &str = "All participants";

/// Returns the English text for a code, or the code itself when unknown
pub fn text(code: &str) -> String {
    let text = match code {
        codes::SEND_ZERO => "Will be sent grade 0 (zero)",
        codes::GRADES_DIFFER => "Local grade is not equal to external",
        codes::GRADE_SENT => "Grade was sent",
        codes::SEND_FAILED => "Grade could not be sent",
        codes::NOT_EXTERNAL => "Not subscribed in the external system",
        codes::NOT_LOCAL => "Not enrolled in the local course",
        codes::CANNOT_SEND_GRADES => {
            "You don't have permission to send grades from this course to an external system"
        }
        codes::CANNOT_VIEW_GRADES => {
            "You don't have permission to view the grades from this course to be sent to an external system"
        }
        codes::CANNOT_ACCESS_GROUPS => "You don't have permission to access the course groups.",
        codes::CANNOT_EXPORT => {
            "The grades of this course are not exportable to an external system."
        }
        codes::SENTGRADES_SUCCESS => "The grades were sent to the external system.",
        codes::SENTGRADES_ERROR => {
            "There were problems when sending grades to the external system. See occurrences in the remarks column."
        }
        codes::NO_SELECTED_STUDENTS => "No students were selected to send grades",
        codes::VISIT_GROUPED_COURSES => {
            "As it is a grouping of courses, sending grades to an external system should be made for each affiliated course by selecting it below. Visit the affiliated course if the grades have been assigned there."
        }
        codes::GROUPED_COURSE => {
            "This course is part of a grouping. Visit the grouping if the grades have been assigned there."
        }
        other => other,
    };
    text.to_string()
}

/// Text for a course whose final grade is not a numeric value
pub fn invalid_type_value(category: &str) -> String {
    format!(
        "The course grades configuration is incorrect: the final grade type must be a numeric value. \
         Please edit settings of the '{category}' grade category and change the 'Grade type' to 'Value'."
    )
}

/// Text for a course whose final grade range differs from the external range
pub fn invalid_grade_range(minimum: f64, maximum: f64, category: &str) -> String {
    format!(
        "The course grades configuration is incorrect: the grades must be in the range [{minimum}..{maximum}]. \
         Please edit settings of the '{category}' grade category and change the 'Minimum grade' to '{minimum}' \
         and 'Maximum grade' to '{maximum}'."
    )
}
