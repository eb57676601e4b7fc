//! Report construction
//!
//! Turns a populated [`ExportSession`] into a [`ReportPage`].

use super::model::{
    CellContent, HeaderCell, ReportCell, ReportPage, ReportRow, RowKind, SendCheckbox,
};
use crate::core::export::{ExportSession, StudentReconciliation, SubmissionOutcome};
use crate::domain::field::{FULL_NAME, GRADE, USER_IDENT};
use crate::domain::strings::{self, codes};
use crate::domain::{
    Alignment, ExternalRecord, FieldSource, FieldValue, MergedField, ReconciliationMessage,
    UserId, ValueType,
};

/// Builds the report table of a session
pub struct ReportBuilder<'a> {
    session: &'a mut ExportSession,
    can_send: bool,
    submission: Option<&'a SubmissionOutcome>,
}

impl<'a> ReportBuilder<'a> {
    /// `can_send` is false when any course-level problem was reported
    pub fn new(session: &'a mut ExportSession, can_send: bool) -> Self {
        Self {
            session,
            can_send,
            submission: None,
        }
    }

    /// Show the messages of a submission made in the same request
    pub fn with_submission(mut self, submission: Option<&'a SubmissionOutcome>) -> Self {
        self.submission = submission;
        self
    }

    /// Reconcile the session and lay out the table
    ///
    /// The session must have been populated.
    pub fn build(self) -> ReportPage {
        let reconciled = self.session.reconcile();
        let session: &ExportSession = self.session;
        let layout = Layout {
            session,
            can_send: self.can_send,
        };

        let mut rows: Vec<ReportRow> = reconciled
            .into_iter()
            .enumerate()
            .map(|(i, rec)| layout.enrolled_row(i + 1, rec, self.submission))
            .collect();

        if session.context().group.is_none() {
            let offset = rows.len();
            rows.extend(
                session
                    .external()
                    .unmatched()
                    .enumerate()
                    .map(|(i, record)| layout.not_local_row(offset + i + 1, record)),
            );
        }

        ReportPage {
            title: session.driver().title_header(),
            driver: session.driver().display_name(),
            actions: session.driver().actions(),
            can_send: self.can_send,
            header: layout.header(),
            rows,
            hidden_fields: if self.can_send {
                layout.hidden_fields()
            } else {
                Vec::new()
            },
        }
    }
}

struct Layout<'s> {
    session: &'s ExportSession,
    can_send: bool,
}

impl Layout<'_> {
    /// Whether a field shows an external and a local sub-column
    fn is_split(&self, field: &MergedField) -> bool {
        field.key == GRADE || (self.can_send && field.editable)
    }

    fn header(&self) -> [Vec<HeaderCell>; 2] {
        let external = self.session.driver().external_column_name();
        let mut top = vec![HeaderCell::new("", Alignment::Left).rowspan(2)];
        let mut sub = Vec::new();

        for field in self.session.mapping().iter() {
            let mut cell = HeaderCell::new(field.name.clone(), field.align);
            if field.key == USER_IDENT || field.key == FULL_NAME {
                cell = cell.sortable(field.key.clone());
            }

            if self.is_split(field) {
                top.push(cell.colspan(2).centered());
                sub.push(HeaderCell::new(external.clone(), field.align));
                sub.push(HeaderCell::new(strings::LOCAL, field.align));
            } else if field.editable {
                top.push(cell);
                sub.push(HeaderCell::new(external.clone(), field.align));
            } else {
                top.push(cell.rowspan(2));
            }
        }

        top.push(HeaderCell::new(strings::REMARKS, Alignment::Left).rowspan(2));
        if self.can_send {
            top.push(HeaderCell::new(strings::SEND, Alignment::Right).rowspan(2));
        }

        [top, sub]
    }

    fn hidden_fields(&self) -> Vec<(String, String)> {
        let ctx = self.session.context();
        let mut fields = Vec::new();
        match &ctx.parent {
            Some(parent) => {
                fields.push(("id".to_string(), parent.id.to_string()));
                fields.push(("affiliatedcourseid".to_string(), ctx.course.id.to_string()));
            }
            None => fields.push(("id".to_string(), ctx.course.id.to_string())),
        }
        let group = ctx.group.map(|g| g.get()).unwrap_or(0);
        fields.push(("groupid".to_string(), group.to_string()));
        fields
    }

    fn enrolled_row(
        &self,
        number: usize,
        rec: StudentReconciliation,
        submission: Option<&SubmissionOutcome>,
    ) -> ReportRow {
        let session = self.session;
        let driver = session.driver();
        let user = rec.student.user_id;
        let external = rec.external.as_ref();

        let mut cells = Vec::new();
        for field in session.mapping().iter() {
            let align = field.align;
            match field.key.as_str() {
                USER_IDENT => cells.push(ReportCell::new(
                    align,
                    CellContent::text(rec.student.ident_str()),
                )),
                FULL_NAME => cells.push(ReportCell::new(
                    align,
                    CellContent::text(rec.student.display_name()),
                )),
                GRADE => {
                    let external_grade = external
                        .map(|r| driver.format_external_grade(r.grade))
                        .unwrap_or_default();
                    cells.push(ReportCell::new(align, CellContent::text(external_grade)));

                    let item = session.grade_item();
                    cells.push(ReportCell::new(
                        align,
                        CellContent::Grade {
                            text: item.format(rec.grade.final_grade),
                            passed: item.is_passed(rec.grade.final_grade),
                        },
                    ));
                }
                key => {
                    let current = match field.source {
                        FieldSource::Driver => session.driver_value(key, user),
                        _ => external_value(external, key),
                    };
                    let display = match field.source {
                        FieldSource::Driver => {
                            CellContent::text(session.driver_display(key, user))
                        }
                        FieldSource::External => read_only(field, &current, user),
                        FieldSource::System => CellContent::text("-"),
                    };
                    cells.push(ReportCell::new(align, display));

                    if self.is_split(field) {
                        let content = if external.is_some() {
                            editable_input(field, &current, user)
                        } else {
                            CellContent::Empty
                        };
                        cells.push(ReportCell::new(align, content));
                    }
                }
            }
        }

        let mut messages: Vec<ReconciliationMessage> = submission
            .and_then(|s| s.messages_for(user))
            .map(<[ReconciliationMessage]>::to_vec)
            .unwrap_or_default();
        messages.extend(rec.messages);

        let send = if self.can_send {
            let allowed = !messages.iter().any(|m| m.prevents_sending);
            let checked = messages.iter().any(|m| m.checked_to_send);
            match (&rec.student.ident, allowed) {
                (Some(ident), true) => Some(SendCheckbox {
                    name: format!("send[{user}]"),
                    value: ident.to_string(),
                    checked,
                }),
                _ => None,
            }
        } else {
            None
        };

        ReportRow {
            number,
            kind: RowKind::Enrolled,
            user_id: Some(user),
            cells,
            messages,
            send,
        }
    }

    fn not_local_row(&self, number: usize, record: &ExternalRecord) -> ReportRow {
        let driver = self.session.driver();
        let mut cells = Vec::new();

        for field in self.session.mapping().iter() {
            let align = field.align;
            match field.key.as_str() {
                USER_IDENT => cells.push(ReportCell::new(
                    align,
                    CellContent::text(record.ident.as_str()),
                )),
                FULL_NAME => cells.push(ReportCell::new(
                    align,
                    CellContent::text(record.fullname.clone()),
                )),
                GRADE => {
                    cells.push(ReportCell::new(
                        align,
                        CellContent::text(driver.format_external_grade(record.grade)),
                    ));
                    cells.push(ReportCell::empty(align));
                }
                key => {
                    let content = match field.source {
                        FieldSource::External => {
                            let current = external_value(Some(record), key);
                            match field.value_type {
                                ValueType::Bool if current.is_truthy() => CellContent::Checkbox {
                                    name: format!("{key}_external[{}]", record.ident),
                                    checked: true,
                                    disabled: true,
                                },
                                ValueType::Bool => CellContent::Empty,
                                _ => CellContent::text(current.to_string()),
                            }
                        }
                        _ => CellContent::Empty,
                    };
                    cells.push(ReportCell::new(align, content));
                    if self.is_split(field) {
                        cells.push(ReportCell::empty(align));
                    }
                }
            }
        }

        ReportRow {
            number,
            kind: RowKind::NotLocal,
            user_id: None,
            cells,
            messages: vec![ReconciliationMessage::error(codes::NOT_LOCAL)],
            send: None,
        }
    }
}

fn external_value(record: Option<&ExternalRecord>, key: &str) -> FieldValue {
    record
        .and_then(|r| r.extra(key))
        .cloned()
        .map(FieldValue::from)
        .unwrap_or_default()
}

/// External column of an externally sourced field
fn read_only(field: &MergedField, current: &FieldValue, user: UserId) -> CellContent {
    match field.value_type {
        ValueType::Bool if current.is_truthy() => CellContent::Checkbox {
            name: format!("{}_external[{user}]", field.key),
            checked: true,
            disabled: true,
        },
        ValueType::Bool => CellContent::Empty,
        _ => CellContent::text(current.to_string()),
    }
}

/// Local column of an editable field
fn editable_input(field: &MergedField, current: &FieldValue, user: UserId) -> CellContent {
    let name = format!("{}[{user}]", field.key);
    let value = if current.is_empty() {
        &field.default
    } else {
        current
    };

    match field.value_type {
        ValueType::Bool => CellContent::Checkbox {
            name,
            checked: value.is_truthy(),
            disabled: false,
        },
        _ => CellContent::Input {
            name,
            value: value.to_string(),
        },
    }
}
