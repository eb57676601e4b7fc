//! Reconciliation messages and course-level notifications
//!
//! [`ReconciliationMessage`] is scoped to one student row and may block or
//! pre-select that student's send checkbox. [`Notification`] is scoped to the
//! whole course; any problem-severity notification makes the report read-only.

use super::strings;
use serde::{Deserialize, Serialize};

/// Severity of a per-student message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSeverity {
    Info,
    Error,
    Success,
}

impl MessageSeverity {
    /// Lowercase name used for CSS classes and text output
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSeverity::Info => "info",
            MessageSeverity::Error => "error",
            MessageSeverity::Success => "success",
        }
    }
}

/// Per-student message attached to a report row
///
/// # Examples
///
/// ```
/// use gradeexport::domain::message::ReconciliationMessage;
///
/// let msg = ReconciliationMessage::info("grades_differ").checked();
/// assert!(msg.checked_to_send);
/// assert!(!msg.prevents_sending);
///
/// let err = ReconciliationMessage::error("notexternal");
/// assert!(err.prevents_sending);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationMessage {
    /// Stable code (see [`strings::codes`])
    pub code: String,

    /// Human readable text
    pub text: String,

    pub severity: MessageSeverity,

    /// Hides the send checkbox of the row
    pub prevents_sending: bool,

    /// Pre-checks the send checkbox of the row
    pub checked_to_send: bool,
}

impl ReconciliationMessage {
    /// Creates a message with explicit text
    pub fn new(severity: MessageSeverity, code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            text: text.into(),
            severity,
            prevents_sending: severity == MessageSeverity::Error,
            checked_to_send: false,
        }
    }

    /// Informational message; never blocks sending
    pub fn info(code: &str) -> Self {
        Self::new(MessageSeverity::Info, code, strings::text(code))
    }

    /// Error message; blocks sending unless relaxed with [`Self::allow_sending`]
    pub fn error(code: &str) -> Self {
        Self::new(MessageSeverity::Error, code, strings::text(code))
    }

    pub fn success(code: &str) -> Self {
        Self::new(MessageSeverity::Success, code, strings::text(code))
    }

    /// Replaces the catalog text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Marks the row's send checkbox as pre-checked
    pub fn checked(mut self) -> Self {
        self.checked_to_send = true;
        self
    }

    pub fn allow_sending(mut self) -> Self {
        self.prevents_sending = false;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == MessageSeverity::Error
    }
}

/// Severity of a course-level notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Message,
    Problem,
    Success,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Message => "message",
            NotificationKind::Problem => "problem",
            NotificationKind::Success => "success",
        }
    }
}

/// Course-level notification shown above the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub code: String,
    pub text: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(kind: NotificationKind, code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            text: text.into(),
            kind,
        }
    }

    pub fn message(code: &str) -> Self {
        Self::new(NotificationKind::Message, code, strings::text(code))
    }

    pub fn problem(code: &str) -> Self {
        Self::new(NotificationKind::Problem, code, strings::text(code))
    }

    pub fn success(code: &str) -> Self {
        Self::new(NotificationKind::Success, code, strings::text(code))
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn is_problem(&self) -> bool {
        self.kind == NotificationKind::Problem
    }
}

/// True when none of the notifications is a problem
pub fn permits_sending(notifications: &[Notification]) -> bool {
    !notifications.iter().any(Notification::is_problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strings::codes;

    #[test]
    fn test_error_prevents_sending_by_default() {
        let msg = ReconciliationMessage::error(codes::NOT_EXTERNAL);
        assert!(msg.prevents_sending);
        assert!(msg.is_error());
        assert_eq!(msg.text, "Not subscribed in the external system");

        let relaxed = msg.allow_sending();
        assert!(!relaxed.prevents_sending);
    }

    #[test]
    fn test_info_and_success_do_not_prevent_sending() {
        assert!(!ReconciliationMessage::info(codes::SEND_ZERO).prevents_sending);
        assert!(!ReconciliationMessage::success(codes::GRADE_SENT).prevents_sending);
    }

    #[test]
    fn test_permits_sending() {
        let advisory = vec![Notification::message(codes::GROUPED_COURSE)];
        assert!(permits_sending(&advisory));

        let blocked = vec![
            Notification::message(codes::GROUPED_COURSE),
            Notification::problem(codes::CANNOT_SEND_GRADES),
        ];
        assert!(!permits_sending(&blocked));
    }

    #[test]
    fn test_serialized_severity_is_lowercase() {
        let json = serde_json::to_value(ReconciliationMessage::info(codes::SEND_ZERO)).unwrap();
        assert_eq!(json["severity"], "info");
    }
}
