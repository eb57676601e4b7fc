//! Plain text renderer for the terminal

use super::model::{ExportPage, ReportPage};
use tabled::builder::Builder;
use tabled::settings::Style;

/// Render a page: notifications, selectors, then the table
pub fn render_page(page: &ExportPage) -> String {
    let mut out = format!("{}\n", page.title);

    for notification in &page.notifications {
        out.push_str(&format!(
            "[{}] {}\n",
            notification.kind.as_str(),
            notification.text
        ));
    }

    if let Some(selector) = &page.course_selector {
        out.push_str("Courses:\n");
        for option in &selector.options {
            let marker = if Some(option.value) == selector.selected { "*" } else { " " };
            out.push_str(&format!(" {marker} {} {}\n", option.value, option.label));
        }
    }

    if let Some(selector) = &page.group_selector {
        out.push_str("Groups:\n");
        for option in &selector.options {
            let marker = if option.value == selector.selected { "*" } else { " " };
            out.push_str(&format!(" {marker} {} {}\n", option.value, option.label));
        }
    }

    if let Some(report) = &page.report {
        out.push('\n');
        out.push_str(&render_report(report));
    }

    out
}

/// Render the table with one header line
///
/// Split columns get a `(External)`/`(Local)` suffix instead of a second
/// header row.
pub fn render_report(report: &ReportPage) -> String {
    let mut builder = Builder::default();
    builder.push_record(header_line(report));

    for row in &report.rows {
        let mut record = vec![format!("{}.", row.number)];
        record.extend(row.cells.iter().map(|c| c.content.plain()));
        record.push(
            row.messages
                .iter()
                .map(|m| m.text.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        );
        if report.can_send {
            record.push(match &row.send {
                Some(send) if send.checked => "[x]".to_string(),
                Some(_) => "[ ]".to_string(),
                None => String::new(),
            });
        }
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::psql());

    let mut out = format!("{} ({})\n", report.title, report.driver);
    out.push_str(&table.to_string());
    out.push('\n');
    out
}

fn header_line(report: &ReportPage) -> Vec<String> {
    let [top, sub] = &report.header;
    let mut sub = sub.iter();
    let mut line = Vec::new();

    for cell in top {
        if cell.rowspan > 1 {
            line.push(cell.text.clone());
            continue;
        }
        for _ in 0..cell.colspan {
            match sub.next() {
                Some(part) => line.push(format!("{} ({})", cell.text, part.text)),
                None => line.push(cell.text.clone()),
            }
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::drivers::DriverActions;
    use crate::core::report::model::{
        CellContent, HeaderCell, ReportCell, ReportRow, RowKind, SendCheckbox,
    };
    use crate::domain::strings::{self, codes};
    use crate::domain::{Alignment, ReconciliationMessage};

    #[test]
    fn test_render_report() {
        let report = ReportPage {
            title: "Export".to_string(),
            driver: "Sample".to_string(),
            actions: DriverActions::default(),
            can_send: true,
            header: [
                vec![
                    HeaderCell::new("", Alignment::Left).rowspan(2),
                    HeaderCell::new("Name", Alignment::Left).rowspan(2),
                    HeaderCell::new("Grade", Alignment::Center).colspan(2),
                    HeaderCell::new(strings::REMARKS, Alignment::Left).rowspan(2),
                    HeaderCell::new(strings::SEND, Alignment::Right).rowspan(2),
                ],
                vec![
                    HeaderCell::new("External", Alignment::Right),
                    HeaderCell::new("Local", Alignment::Right),
                ],
            ],
            rows: vec![ReportRow {
                number: 1,
                kind: RowKind::Enrolled,
                user_id: None,
                cells: vec![
                    ReportCell::new(Alignment::Left, CellContent::text("Ana Silva")),
                    ReportCell::new(Alignment::Right, CellContent::text("71.00")),
                    ReportCell::new(
                        Alignment::Right,
                        CellContent::Grade {
                            text: "70.00".to_string(),
                            passed: None,
                        },
                    ),
                ],
                messages: vec![ReconciliationMessage::info(codes::GRADES_DIFFER).checked()],
                send: Some(SendCheckbox {
                    name: "send[10]".to_string(),
                    value: "u1".to_string(),
                    checked: true,
                }),
            }],
            hidden_fields: Vec::new(),
        };

        assert_eq!(
            header_line(&report),
            vec!["", "Name", "Grade (External)", "Grade (Local)", "Remarks", "Send"]
        );

        let text = render_report(&report);
        assert!(text.starts_with("Export (Sample)"));
        assert!(text.contains("Ana Silva"));
        assert!(text.contains("Local grade is not equal to external"));
        assert!(text.contains("[x]"));
    }
}
