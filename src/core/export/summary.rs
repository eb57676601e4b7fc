//! Submission results
//!
//! This module defines structures for tracking and reporting the outcome of a
//! grade submission.

use crate::domain::ids::{ExternalId, UserId};
use crate::domain::strings::codes;
use crate::domain::{Notification, ReconciliationMessage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Messages returned for one submitted student
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSubmission {
    pub user_id: UserId,
    pub external_id: ExternalId,
    pub messages: Vec<ReconciliationMessage>,
}

impl StudentSubmission {
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(ReconciliationMessage::is_error)
    }
}

/// Outcome of one `send_data` call, in selection order
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    /// Correlates the log lines of one submission
    pub batch_id: Uuid,

    pub started_at: DateTime<Utc>,

    #[serde(skip)]
    pub duration: Duration,

    pub results: Vec<StudentSubmission>,
}

impl SubmissionOutcome {
    /// Create an empty outcome starting now
    pub fn new() -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            started_at: Utc::now(),
            duration: Duration::from_secs(0),
            results: Vec::new(),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn push(&mut self, result: StudentSubmission) {
        self.results.push(result);
    }

    /// True when any student's messages contain an error
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(StudentSubmission::has_errors)
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| !r.has_errors()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.has_errors()).count()
    }

    /// Messages returned for a student, if they were part of the submission
    pub fn messages_for(&self, user: UserId) -> Option<&[ReconciliationMessage]> {
        self.results
            .iter()
            .find(|r| r.user_id == user)
            .map(|r| r.messages.as_slice())
    }

    /// Course-level notification summarising the submission
    pub fn notification(&self) -> Notification {
        if self.has_errors() {
            Notification::problem(codes::SENTGRADES_ERROR)
        } else {
            Notification::success(codes::SENTGRADES_SUCCESS)
        }
    }

    pub fn log_summary(&self) {
        crate::log_submission_complete!(self.success_count(), self.failure_count(), self.duration);

        if self.has_errors() {
            tracing::warn!(
                batch_id = %self.batch_id,
                failed = self.failure_count(),
                "Grade submission completed with errors"
            );
        }
    }
}

impl Default for SubmissionOutcome {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NotificationKind;

    fn submission(id: u64, messages: Vec<ReconciliationMessage>) -> StudentSubmission {
        StudentSubmission {
            user_id: UserId::new(id).unwrap(),
            external_id: ExternalId::new(format!("u{id}")).unwrap(),
            messages,
        }
    }

    #[test]
    fn test_empty_outcome_is_success() {
        let outcome = SubmissionOutcome::new();
        assert!(!outcome.has_errors());
        assert_eq!(outcome.success_count(), 0);
        assert_eq!(outcome.notification().kind, NotificationKind::Success);
    }

    #[test]
    fn test_outcome_counts_and_notification() {
        let mut outcome = SubmissionOutcome::new();
        outcome.push(submission(1, vec![ReconciliationMessage::success(codes::GRADE_SENT)]));
        outcome.push(submission(2, vec![ReconciliationMessage::error(codes::SEND_FAILED)]));

        assert!(outcome.has_errors());
        assert_eq!(outcome.success_count(), 1);
        assert_eq!(outcome.failure_count(), 1);

        let notification = outcome.notification();
        assert_eq!(notification.code, codes::SENTGRADES_ERROR);
        assert!(notification.is_problem());
    }

    #[test]
    fn test_messages_for() {
        let mut outcome = SubmissionOutcome::new();
        outcome.push(submission(3, vec![ReconciliationMessage::success(codes::GRADE_SENT)]));

        let messages = outcome.messages_for(UserId::new(3).unwrap()).unwrap();
        assert_eq!(messages[0].code, codes::GRADE_SENT);
        assert!(outcome.messages_for(UserId::new(4).unwrap()).is_none());
    }
}
