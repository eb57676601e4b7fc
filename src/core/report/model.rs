//! Report page structures
//!
//! Renderer-independent description of the export table. The HTML and text
//! renderers walk these structures; the JSON output is their serde form.

use crate::adapters::drivers::DriverActions;
use crate::domain::ids::UserId;
use crate::domain::{Alignment, Notification, ReconciliationMessage};
use serde::Serialize;

/// One header cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderCell {
    pub text: String,

    /// `orderby` value when the column can be sorted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,

    pub colspan: usize,
    pub rowspan: usize,
    pub align: Alignment,
}

impl HeaderCell {
    pub fn new(text: impl Into<String>, align: Alignment) -> Self {
        Self {
            text: text.into(),
            sort_key: None,
            colspan: 1,
            rowspan: 1,
            align,
        }
    }

    pub fn colspan(mut self, colspan: usize) -> Self {
        self.colspan = colspan;
        self
    }

    pub fn rowspan(mut self, rowspan: usize) -> Self {
        self.rowspan = rowspan;
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Alignment::Center;
        self
    }

    pub fn sortable(mut self, key: impl Into<String>) -> Self {
        self.sort_key = Some(key.into());
        self
    }
}

/// Content of a body cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CellContent {
    Empty,
    Text {
        text: String,
    },
    /// Local final grade; `passed` drives pass/fail styling
    Grade {
        text: String,
        passed: Option<bool>,
    },
    Checkbox {
        name: String,
        checked: bool,
        disabled: bool,
    },
    Input {
        name: String,
        value: String,
    },
}

impl CellContent {
    pub fn text(text: impl Into<String>) -> Self {
        CellContent::Text { text: text.into() }
    }

    /// Plain text view, used by the text renderer
    pub fn plain(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Text { text } | CellContent::Grade { text, .. } => text.clone(),
            CellContent::Checkbox { checked, .. } => {
                if *checked { "[x]" } else { "[ ]" }.to_string()
            }
            CellContent::Input { value, .. } => value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportCell {
    pub align: Alignment,
    pub content: CellContent,
}

impl ReportCell {
    pub fn new(align: Alignment, content: CellContent) -> Self {
        Self { align, content }
    }

    pub fn empty(align: Alignment) -> Self {
        Self::new(align, CellContent::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// Student enrolled in the course
    Enrolled,
    /// External record no enrolled student matched
    NotLocal,
}

/// The `send[userid]` checkbox of a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendCheckbox {
    pub name: String,
    /// External identifier submitted for the student
    pub value: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub number: usize,
    pub kind: RowKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    pub cells: Vec<ReportCell>,
    pub messages: Vec<ReconciliationMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub send: Option<SendCheckbox>,
}

/// The export table of one course
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPage {
    pub title: String,

    /// Display name of the selected driver
    pub driver: String,

    pub actions: DriverActions,

    /// Whether the page is a form that can send grades
    pub can_send: bool,

    /// First and second header rows
    pub header: [Vec<HeaderCell>; 2],

    pub rows: Vec<ReportRow>,

    /// Hidden form fields carried by a submission
    pub hidden_fields: Vec<(String, String)>,
}

impl ReportPage {
    pub fn enrolled_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| r.kind == RowKind::Enrolled)
    }

    pub fn not_local_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| r.kind == RowKind::NotLocal)
    }

    pub fn row_for(&self, user: UserId) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.user_id == Some(user))
    }

    /// Number of columns in the table body
    pub fn column_count(&self) -> usize {
        self.rows
            .first()
            .map(|r| r.cells.len() + 2 + usize::from(self.can_send))
            .unwrap_or(0)
    }
}

/// Course picker shown for a grouping course
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSelector {
    pub options: Vec<SelectOption>,
    pub selected: Option<u64>,
}

/// Group picker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSelector {
    pub options: Vec<SelectOption>,
    /// `0` means all participants
    pub selected: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: u64,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: u64, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

/// Query parameters that keep the page state across links and forms
///
/// Holds `id`, and once known `affiliatedcourseid`, `groupid` and `orderby`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageQuery {
    params: Vec<(String, String)>,
}

impl PageQuery {
    pub fn new(course_id: u64) -> Self {
        Self {
            params: vec![("id".to_string(), course_id.to_string())],
        }
    }

    /// Replace the value of `key`, appending it when absent
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.params.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Parameters except the named ones
    pub fn without<'a>(&'a self, keys: &'a [&str]) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.params
            .iter()
            .filter(move |(k, _)| !keys.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `path` with the encoded query, `overrides` replacing or adding keys
    pub fn href(&self, path: &str, overrides: &[(&str, &str)]) -> String {
        let mut query = self.clone();
        for (key, value) in overrides {
            query.set(key, *value);
        }
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query.params.iter())
            .finish();
        format!("{path}?{encoded}")
    }
}

/// Everything shown for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPage {
    pub title: String,

    /// Course the page was requested for
    pub course_id: u64,

    pub notifications: Vec<Notification>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_selector: Option<CourseSelector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_selector: Option<GroupSelector>,

    /// Absent when the request stopped before the table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportPage>,

    pub query: PageQuery,
}

impl ExportPage {
    pub fn new(title: impl Into<String>, course_id: u64) -> Self {
        Self {
            title: title.into(),
            course_id,
            notifications: Vec::new(),
            course_selector: None,
            group_selector: None,
            report: None,
            query: PageQuery::new(course_id),
        }
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn has_notification(&self, code: &str) -> bool {
        self.notifications.iter().any(|n| n.code == code)
    }
}
