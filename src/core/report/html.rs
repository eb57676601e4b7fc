//! HTML renderer
//!
//! Produces a standalone page. All text is escaped. When the report can send
//! grades the table is wrapped in a POST form carrying the hidden `id`,
//! `affiliatedcourseid` and `groupid` fields. Every link and form keeps the
//! page query, so sorting or switching group stays in the same view.

use super::model::{
    CellContent, ExportPage, HeaderCell, PageQuery, ReportCell, ReportPage, ReportRow,
};
use crate::adapters::drivers::ActionFormat;
use crate::domain::strings;
use crate::domain::{MessageSeverity, NotificationKind};
use std::fmt::Write;

/// Escape text for use in HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render a full page
pub fn render_page(page: &ExportPage, base_url: &str) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(
        html,
        "<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>",
        escape(&page.title)
    );
    let _ = writeln!(html, "<h2>{}</h2>", escape(&page.title));

    for notification in &page.notifications {
        let class = match notification.kind {
            NotificationKind::Problem => "notifyproblem",
            NotificationKind::Success => "notifysuccess",
            NotificationKind::Message => "notifymessage",
        };
        let _ = writeln!(
            html,
            "<div class=\"{class}\">{}</div>",
            escape(&notification.text)
        );
    }

    if let Some(selector) = &page.course_selector {
        // a new course starts without a group
        let keep: Vec<_> = page
            .query
            .without(&["id", "affiliatedcourseid", "groupid"])
            .collect();
        html.push_str(&select_form(
            base_url,
            page.course_id,
            "affiliatedcourseid",
            "Course",
            selector.selected.unwrap_or(0),
            selector.options.iter().map(|o| (o.value, o.label.as_str())),
            &keep,
        ));
    }

    if let Some(selector) = &page.group_selector {
        let keep: Vec<_> = page.query.without(&["id", "groupid"]).collect();
        html.push_str(&select_form(
            base_url,
            page.course_id,
            "groupid",
            "Groups",
            selector.selected,
            selector.options.iter().map(|o| (o.value, o.label.as_str())),
            &keep,
        ));
    }

    if let Some(report) = &page.report {
        html.push_str(&render_report(report, base_url, &page.query));
    }

    html.push_str("</body></html>\n");
    html
}

fn select_form<'a>(
    base_url: &str,
    course_id: u64,
    name: &str,
    label: &str,
    selected: u64,
    options: impl Iterator<Item = (u64, &'a str)>,
    extra: &[(&str, &str)],
) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<form method=\"get\" action=\"{}\" class=\"groupselector\">\
         <input type=\"hidden\" name=\"id\" value=\"{course_id}\">",
        escape(base_url)
    );
    for (key, value) in extra {
        let _ = write!(
            html,
            "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
            escape(key),
            escape(value)
        );
    }
    let _ = write!(
        html,
        "<label>{}: <select name=\"{name}\" onchange=\"this.form.submit()\">",
        escape(label)
    );
    for (value, text) in options {
        let marker = if value == selected { " selected" } else { "" };
        let _ = write!(html, "<option value=\"{value}\"{marker}>{}</option>", escape(text));
    }
    html.push_str("</select></label></form>\n");
    html
}

/// Render the export table, including driver actions and the form
pub fn render_report(report: &ReportPage, base_url: &str, query: &PageQuery) -> String {
    let mut html = String::new();

    if !report.actions.is_empty() {
        let _ = write!(
            html,
            "<div class=\"driver-actions\" style=\"text-align:{}\">",
            report.actions.align.as_str()
        );
        for action in &report.actions.actions {
            let href = query.href(base_url, &[("action", action.name.as_str())]);
            match report.actions.format {
                ActionFormat::Button => {
                    let _ = write!(
                        html,
                        "<form method=\"post\" action=\"{}\"><button type=\"submit\">{}</button></form>",
                        escape(&href),
                        escape(&action.label)
                    );
                }
                ActionFormat::Link => {
                    let _ = write!(
                        html,
                        "<a href=\"{}\">{}</a> ",
                        escape(&href),
                        escape(&action.label)
                    );
                }
            }
        }
        html.push_str("</div>\n");
    }

    if report.can_send {
        let _ = writeln!(
            html,
            "<form method=\"post\" action=\"{}\">",
            escape(&query.href(base_url, &[]))
        );
        for (name, value) in &report.hidden_fields {
            let _ = writeln!(
                html,
                "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
                escape(name),
                escape(value)
            );
        }
    }

    html.push_str("<table class=\"generaltable\">\n<thead>\n");
    for row in &report.header {
        if row.is_empty() {
            continue;
        }
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&header_cell(cell, base_url, query));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</thead>\n<tbody>\n");

    for row in &report.rows {
        html.push_str(&body_row(row, report.can_send));
    }

    if report.can_send {
        let _ = writeln!(
            html,
            "<tr><td colspan=\"{}\"></td><td style=\"text-align:right\">\
             <input type=\"submit\" name=\"sendgrades\" value=\"{}\"></td></tr>",
            report.column_count().saturating_sub(1),
            escape(strings::SEND_GRADES)
        );
    }

    html.push_str("</tbody>\n</table>\n");
    if report.can_send {
        html.push_str("</form>\n");
    }
    html
}

fn header_cell(cell: &HeaderCell, base_url: &str, query: &PageQuery) -> String {
    let mut attrs = format!(" style=\"text-align:{}\"", cell.align.as_str());
    if cell.colspan > 1 {
        let _ = write!(attrs, " colspan=\"{}\"", cell.colspan);
    }
    if cell.rowspan > 1 {
        let _ = write!(attrs, " rowspan=\"{}\"", cell.rowspan);
    }

    let text = match &cell.sort_key {
        Some(key) => format!(
            "<a href=\"{}\">{}</a>",
            escape(&query.href(base_url, &[("orderby", key.as_str())])),
            escape(&cell.text)
        ),
        None => escape(&cell.text),
    };
    format!("<th{attrs}>{text}</th>")
}

fn body_row(row: &ReportRow, can_send: bool) -> String {
    let mut html = String::from("<tr>");
    let _ = write!(html, "<td>{}.</td>", row.number);

    for cell in &row.cells {
        html.push_str(&body_cell(cell));
    }

    html.push_str("<td>");
    for message in &row.messages {
        let class = match message.severity {
            MessageSeverity::Error => "text-error",
            MessageSeverity::Success => "text-success",
            MessageSeverity::Info => "text-info",
        };
        let _ = write!(html, "<div class=\"{class}\">{}</div>", escape(&message.text));
    }
    html.push_str("</td>");

    if can_send {
        match &row.send {
            Some(send) => {
                let _ = write!(
                    html,
                    "<td style=\"text-align:right\"><input type=\"checkbox\" name=\"{}\" value=\"{}\"{}></td>",
                    escape(&send.name),
                    escape(&send.value),
                    if send.checked { " checked" } else { "" }
                );
            }
            None => html.push_str("<td></td>"),
        }
    }

    html.push_str("</tr>\n");
    html
}

fn body_cell(cell: &ReportCell) -> String {
    let content = match &cell.content {
        CellContent::Empty => String::new(),
        CellContent::Text { text } => escape(text),
        CellContent::Grade { text, passed } => {
            let class = match passed {
                Some(true) => "gradepass",
                Some(false) => "gradefail",
                None => "",
            };
            format!("<span class=\"{class}\">{}</span>", escape(text))
        }
        CellContent::Checkbox {
            name,
            checked,
            disabled,
        } => format!(
            "<input type=\"checkbox\" name=\"{}\" value=\"1\"{}{}>",
            escape(name),
            if *checked { " checked" } else { "" },
            if *disabled { " disabled" } else { "" }
        ),
        CellContent::Input { name, value } => format!(
            "<input type=\"text\" name=\"{}\" value=\"{}\" size=\"6\">",
            escape(name),
            escape(value)
        ),
    };
    format!(
        "<td style=\"text-align:{}\">{content}</td>",
        cell.align.as_str()
    )
}
