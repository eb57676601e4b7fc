//! Action command implementation
//!
//! Runs a driver action (such as `export_csv`) and saves its output.

use super::{coordinator, load_checked, RequestArgs, EXIT_CONFIG, EXIT_OK};
use crate::core::export::ExportResponse;
use clap::Args;
use std::fs;

/// Arguments for the action command
#[derive(Args, Debug)]
pub struct ActionArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Action name declared by the driver
    #[arg(long)]
    pub name: String,

    /// Output file; defaults to the file name suggested by the driver
    #[arg(short, long)]
    pub output: Option<String>,
}

impl ActionArgs {
    /// Execute the action command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(course_id = self.request.course, action = %self.name, "Starting action command");

        let Some(config) = load_checked(config_path) else {
            return Ok(EXIT_CONFIG);
        };
        let coordinator = match coordinator(&config) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let request = self.request.to_request()?.with_action(self.name.clone());
        match coordinator.handle(self.request.user_id()?, request).await? {
            ExportResponse::Action(output) => {
                let path = self.output.clone().unwrap_or(output.filename);
                fs::write(&path, &output.body)?;
                println!("✅ {} written to {path} ({} bytes)", output.content_type, output.body.len());
                Ok(EXIT_OK)
            }
            ExportResponse::Page(page) => {
                eprintln!("❌ The action was not run");
                for notification in &page.notifications {
                    eprintln!("   - {}", notification.text);
                }
                Ok(EXIT_CONFIG)
            }
        }
    }
}
