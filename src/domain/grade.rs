//! Course grade item and local grade records

use super::ids::{CourseId, UserId};
use serde::{Deserialize, Serialize};

/// Decimal places used when comparing grades
pub const GRADE_COMPARE_DECIMALS: i32 = 5;

/// Kind of value a grade item holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeType {
    #[default]
    Value,
    Scale,
    Text,
    None,
}

/// The course final grade item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeItem {
    pub id: u64,

    pub course_id: CourseId,

    #[serde(default)]
    pub grade_type: GradeType,

    #[serde(default)]
    pub grade_min: f64,

    #[serde(default = "default_grade_max")]
    pub grade_max: f64,

    /// Pass mark; `None` disables pass/fail styling
    #[serde(default)]
    pub grade_pass: Option<f64>,

    /// Display decimals
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// Name of the top grade category, shown in configuration notices
    #[serde(default)]
    pub category_name: String,
}

impl GradeItem {
    /// Formats a final grade for display, `-` when absent
    pub fn format(&self, value: Option<f64>) -> String {
        match value {
            Some(v) => format!("{:.*}", self.decimals, v),
            None => "-".to_string(),
        }
    }

    /// Pass/fail verdict, `None` when there is no pass mark or no grade
    pub fn is_passed(&self, value: Option<f64>) -> Option<bool> {
        match (self.grade_pass, value) {
            (Some(pass), Some(v)) if pass > 0.0 => Some(v >= pass),
            _ => None,
        }
    }
}

fn default_grade_max() -> f64 {
    100.0
}

fn default_decimals() -> usize {
    2
}

/// Read-only view of one student's final grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalGrade {
    pub user_id: UserId,

    /// `None` when no final grade has been recorded
    pub final_grade: Option<f64>,
}

impl LocalGrade {
    pub fn new(user_id: UserId, final_grade: Option<f64>) -> Self {
        Self {
            user_id,
            final_grade,
        }
    }

    /// Placeholder for a student without a grade record
    pub fn empty(user_id: UserId) -> Self {
        Self::new(user_id, None)
    }

    /// The value that would be sent: the final grade, or zero when absent
    pub fn effective(&self) -> f64 {
        self.final_grade.unwrap_or(0.0)
    }
}

/// Rounds a grade to the comparison precision
pub fn round_grade(value: f64) -> f64 {
    let factor = 10f64.powi(GRADE_COMPARE_DECIMALS);
    (value * factor).round() / factor
}

/// True when two grades differ at the comparison precision; a missing value
/// always differs
pub fn grades_differ(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => round_grade(a) != round_grade(b),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> GradeItem {
        GradeItem {
            id: 1,
            course_id: CourseId::new(2).unwrap(),
            grade_type: GradeType::Value,
            grade_min: 0.0,
            grade_max: 100.0,
            grade_pass: Some(60.0),
            decimals: 1,
            category_name: "Calculus".to_string(),
        }
    }

    #[test]
    fn test_format() {
        assert_eq!(item().format(Some(72.456)), "72.5");
        assert_eq!(item().format(None), "-");
    }

    #[test]
    fn test_is_passed() {
        assert_eq!(item().is_passed(Some(60.0)), Some(true));
        assert_eq!(item().is_passed(Some(59.9)), Some(false));
        assert_eq!(item().is_passed(None), None);

        let mut no_pass = item();
        no_pass.grade_pass = None;
        assert_eq!(no_pass.is_passed(Some(90.0)), None);
    }

    #[test]
    fn test_effective_grade() {
        let uid = UserId::new(3).unwrap();
        assert_eq!(LocalGrade::empty(uid).effective(), 0.0);
        assert_eq!(LocalGrade::new(uid, Some(8.5)).effective(), 8.5);
    }

    #[test]
    fn test_grade_item_defaults_from_json() {
        let item: GradeItem =
            serde_json::from_value(serde_json::json!({"id": 4, "course_id": 2})).unwrap();
        assert_eq!(item.grade_type, GradeType::Value);
        assert_eq!(item.grade_max, 100.0);
        assert_eq!(item.decimals, 2);
    }
}
