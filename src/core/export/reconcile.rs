//! Grade reconciliation
//!
//! Pairs each enrolled student with the external record carrying the same
//! identifier and produces the per-student messages shown in the report.

use crate::adapters::drivers::ExportDriver;
use crate::domain::grade::grades_differ;
use crate::domain::strings::codes;
use crate::domain::{
    EnrolledStudent, ExternalRecord, ExternalRecords, LocalGrade, ReconciliationMessage,
};
use crate::domain::ids::UserId;
use serde::Serialize;
use std::collections::HashMap;

/// Default grade check
///
/// A missing local grade is sent as zero and compared as zero. When an
/// external record is given, grades that differ at five decimals (or an
/// external record without a grade) produce a pre-checked "grades differ"
/// message.
pub fn check_grade(
    local: &LocalGrade,
    external: Option<&ExternalRecord>,
) -> Vec<ReconciliationMessage> {
    let mut messages = Vec::new();

    if local.final_grade.is_none() {
        messages.push(ReconciliationMessage::info(codes::SEND_ZERO));
    }

    if let Some(record) = external {
        if grades_differ(Some(local.effective()), record.grade) {
            messages.push(ReconciliationMessage::info(codes::GRADES_DIFFER).checked());
        }
    }

    messages
}

/// Reconciliation outcome for one enrolled student
#[derive(Debug, Clone, Serialize)]
pub struct StudentReconciliation {
    pub student: EnrolledStudent,
    pub grade: LocalGrade,
    pub external: Option<ExternalRecord>,
    pub messages: Vec<ReconciliationMessage>,
}

impl StudentReconciliation {
    /// Whether the send checkbox is shown
    pub fn can_send(&self) -> bool {
        !self.messages.iter().any(|m| m.prevents_sending)
    }

    /// Whether the send checkbox starts checked
    pub fn checked(&self) -> bool {
        self.messages.iter().any(|m| m.checked_to_send)
    }
}

/// Reconcile every enrolled student in order
///
/// Matched external records are flagged in `external` so the caller can list
/// the remaining ones as not enrolled locally. A student without a matching
/// record (or without an identifier) gets a "not in the external system"
/// error next to the driver's grade check.
pub fn reconcile(
    driver: &dyn ExportDriver,
    students: &[EnrolledStudent],
    grades: &HashMap<UserId, LocalGrade>,
    external: &mut ExternalRecords,
) -> Vec<StudentReconciliation> {
    students
        .iter()
        .map(|student| {
            let grade = grades
                .get(&student.user_id)
                .cloned()
                .unwrap_or_else(|| LocalGrade::empty(student.user_id));

            let record = student
                .ident
                .as_ref()
                .and_then(|ident| external.mark_matched(ident))
                .cloned();

            let messages = match &record {
                Some(record) => driver.check_grade(&grade, Some(record)),
                None => {
                    let mut messages = vec![ReconciliationMessage::error(codes::NOT_EXTERNAL)];
                    messages.extend(driver.check_grade(&grade, None));
                    messages
                }
            };

            StudentReconciliation {
                student: student.clone(),
                grade,
                external: record,
                messages,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::ExternalId;
    use test_case::test_case;

    fn user(id: u64) -> UserId {
        UserId::new(id).unwrap()
    }

    fn record(ident: &str, grade: Option<f64>) -> ExternalRecord {
        ExternalRecord::new(ExternalId::new(ident).unwrap(), ident.to_uppercase(), grade)
    }

    fn codes_of(messages: &[ReconciliationMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.code.as_str()).collect()
    }

    #[test_case(Some(70.0), Some(70.0), false ; "equal grades")]
    #[test_case(Some(70.000001), Some(70.0), false ; "difference below tolerance")]
    #[test_case(Some(70.00001), Some(70.0), true ; "difference at tolerance")]
    #[test_case(Some(70.0), Some(71.0), true ; "different grades")]
    #[test_case(Some(70.0), None, true ; "external without grade")]
    #[test_case(None, Some(0.0), false ; "missing local compared as zero")]
    #[test_case(None, Some(5.0), true ; "missing local against nonzero")]
    fn test_check_grade_differ(local: Option<f64>, external: Option<f64>, differ: bool) {
        let grade = LocalGrade::new(user(1), local);
        let messages = check_grade(&grade, Some(&record("u1", external)));
        let differ_msg = messages.iter().find(|m| m.code == codes::GRADES_DIFFER);

        assert_eq!(differ_msg.is_some(), differ);
        if let Some(m) = differ_msg {
            assert!(m.checked_to_send);
            assert!(!m.prevents_sending);
        }
    }

    #[test]
    fn test_check_grade_send_zero() {
        let messages = check_grade(&LocalGrade::empty(user(1)), None);
        assert_eq!(codes_of(&messages), vec![codes::SEND_ZERO]);
        assert!(!messages[0].prevents_sending);

        assert!(check_grade(&LocalGrade::new(user(1), Some(50.0)), None).is_empty());
    }

    #[test]
    fn test_student_reconciliation_flags() {
        let mut rec = StudentReconciliation {
            student: EnrolledStudent {
                user_id: user(1),
                ident: None,
                firstname: "Ana".to_string(),
                lastname: "Silva".to_string(),
            },
            grade: LocalGrade::empty(user(1)),
            external: None,
            messages: vec![ReconciliationMessage::info(codes::GRADES_DIFFER).checked()],
        };
        assert!(rec.can_send());
        assert!(rec.checked());

        rec.messages.push(ReconciliationMessage::error(codes::NOT_EXTERNAL));
        assert!(!rec.can_send());
    }
}
