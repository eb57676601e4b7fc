//! Send command implementation
//!
//! Sends grades the way the report form does. Students are picked by user
//! id, or all pre-checked students are sent with `--checked`; the external
//! identifier is taken from the report.

use super::{coordinator, load_checked, RequestArgs, EXIT_CONFIG, EXIT_OK, EXIT_PARTIAL};
use crate::core::export::{ExportResponse, Submission};
use crate::core::report::{text, ReportPage};
use crate::domain::ids::{ExternalId, UserId};
use crate::domain::strings::codes;
use clap::Args;
use std::io::{self, Write};

/// Arguments for the send command
#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// User id of a student to send (repeatable)
    #[arg(long = "student", value_name = "USER_ID")]
    pub students: Vec<u64>,

    /// Send every student the report pre-selects
    #[arg(long)]
    pub checked: bool,

    /// Editable field value as posted by the form, e.g. `attendance[10]=1` (repeatable)
    #[arg(long = "field", value_name = "NAME[USER_ID]=VALUE")]
    pub fields: Vec<String>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl SendArgs {
    /// Execute the send command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(course_id = self.request.course, "Starting send command");

        let Some(config) = load_checked(config_path) else {
            return Ok(EXIT_CONFIG);
        };
        let coordinator = match coordinator(&config) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let user = self.request.user_id()?;

        let ExportResponse::Page(page) = coordinator.handle(user, self.request.to_request()?).await?
        else {
            anyhow::bail!("Unexpected action output");
        };
        let Some(report) = page.report else {
            for notification in &page.notifications {
                eprintln!("❌ {}", notification.text);
            }
            return Ok(EXIT_CONFIG);
        };
        if !report.can_send {
            eprintln!("❌ Grades of this course cannot be sent:");
            for notification in page.notifications.iter().filter(|n| n.is_problem()) {
                eprintln!("   - {}", notification.text);
            }
            return Ok(EXIT_CONFIG);
        }

        let selected = match self.selection(&report) {
            Ok(selected) => selected,
            Err(message) => {
                eprintln!("❌ {message}");
                return Ok(EXIT_CONFIG);
            }
        };

        if !self.yes {
            println!("Sending {} grade(s) with driver {}", selected.len(), report.driver);
            print!("Proceed? [y/N]: ");
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Send cancelled.");
                return Ok(EXIT_OK);
            }
        }

        let mut submission = Submission::from_form(&self.field_pairs()?)?;
        submission.selected = selected;

        let request = self.request.to_request()?.with_submission(submission);
        let ExportResponse::Page(page) = coordinator.handle(user, request).await? else {
            anyhow::bail!("Unexpected action output");
        };

        print!("{}", text::render_page(&page));

        if page.has_notification(codes::SENTGRADES_ERROR) {
            Ok(EXIT_PARTIAL)
        } else {
            Ok(EXIT_OK)
        }
    }

    /// Students to send, with the identifier shown in their send checkbox
    fn selection(&self, report: &ReportPage) -> Result<Vec<(UserId, ExternalId)>, String> {
        let mut selected = Vec::new();

        for row in report.enrolled_rows() {
            let (Some(user), Some(send)) = (row.user_id, &row.send) else {
                continue;
            };
            let wanted = self.students.contains(&user.get()) || (self.checked && send.checked);
            if wanted {
                let ident = ExternalId::new(send.value.as_str())?;
                selected.push((user, ident));
            }
        }

        for id in &self.students {
            if !selected.iter().any(|(user, _)| user.get() == *id) {
                return Err(format!("Student {id} cannot be sent from this report"));
            }
        }
        if selected.is_empty() {
            return Err("No students selected; use --student or --checked".to_string());
        }
        Ok(selected)
    }

    fn field_pairs(&self) -> anyhow::Result<Vec<(String, String)>> {
        self.fields
            .iter()
            .map(|field| {
                field
                    .split_once('=')
                    .map(|(key, value)| (key.trim().to_string(), value.to_string()))
                    .ok_or_else(|| anyhow::anyhow!("Invalid --field '{field}', expected NAME[USER_ID]=VALUE"))
            })
            .collect()
    }
}
