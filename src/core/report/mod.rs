//! Report presentation
//!
//! [`ReportBuilder`] lays out a populated session as a [`ReportPage`];
//! [`html`] and [`text`] render it. JSON output is the serde form of the
//! model.

pub mod builder;
pub mod html;
pub mod model;
pub mod text;

pub use builder::ReportBuilder;
pub use model::{
    CellContent, CourseSelector, ExportPage, GroupSelector, HeaderCell, PageQuery, ReportCell,
    ReportPage, ReportRow, RowKind, SelectOption, SendCheckbox,
};

use crate::domain::{GradeExportError, Result};

/// Output format of a rendered page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = GradeExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            other => Err(GradeExportError::Validation(format!(
                "Unknown output format '{other}'. Must be one of: text, json, html"
            ))),
        }
    }
}

/// Render a page in the requested format
///
/// `base_url` is the form target used by the HTML renderer.
pub fn render(page: &ExportPage, format: OutputFormat, base_url: &str) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::render_page(page)),
        OutputFormat::Html => Ok(html::render_page(page, base_url)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(page)?),
    }
}
