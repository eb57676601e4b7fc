//! Report command implementation
//!
//! Prints the export page of a course as text, JSON or HTML.

use super::{coordinator, load_checked, RequestArgs, EXIT_CONFIG, EXIT_OK};
use crate::core::export::ExportResponse;
use crate::core::report::{render, OutputFormat};
use clap::Args;
use std::fs;

/// Arguments for the report command
#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Output format (text, json, html)
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

impl ReportArgs {
    /// Execute the report command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(course_id = self.request.course, "Starting report command");

        let format: OutputFormat = match self.format.parse() {
            Ok(format) => format,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let Some(config) = load_checked(config_path) else {
            return Ok(EXIT_CONFIG);
        };
        let coordinator = match coordinator(&config) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let request = self.request.to_request()?;
        let page = match coordinator.handle(self.request.user_id()?, request).await? {
            ExportResponse::Page(page) => page,
            ExportResponse::Action(_) => anyhow::bail!("Unexpected action output"),
        };

        let base_url = format!("/courses/{}/export", self.request.course);
        let rendered = render(&page, format, &base_url)?;
        match &self.output {
            Some(path) => {
                fs::write(path, rendered)?;
                println!("✅ Report written to {path}");
            }
            None => print!("{rendered}"),
        }

        Ok(EXIT_OK)
    }
}
