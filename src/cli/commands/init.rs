//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "gradeexport.toml")]
    pub output: String,

    /// Include the REST grading service section and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing gradeexport configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Point [host] snapshot_path at your host platform export");
                println!("  3. For the http driver, set GRADING_API_TOKEN in .env");
                println!("  4. Validate configuration: gradeexport validate-config");
                println!("  5. Show a report: gradeexport report --course <id> --user <id>");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Gradeexport Configuration File

[application]
log_level = "info"

[drivers]
enabled = ["sample"]

[host]
snapshot_path = "demos/host_snapshot.json"

[sample]
external_data_path = "demos/external_grades.json"

[server]
host = "127.0.0.1"
port = 8080

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Gradeexport Configuration File
#
# Values can reference environment variables with ${VAR_NAME}, and any key
# can be overridden with GRADEEXPORT_<SECTION>_<KEY>.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Drivers
# ============================================================================
[drivers]
# Asked in order; the first driver that knows the course is used
enabled = ["http", "sample"]

# ============================================================================
# Host Platform
# ============================================================================
[host]
# JSON snapshot of courses, enrolments, groups, grades and permissions
snapshot_path = "demos/host_snapshot.json"

# ============================================================================
# Sample Driver
# ============================================================================
[sample]
# External records served by the sample driver
external_data_path = "demos/external_grades.json"

# ============================================================================
# REST Grading Service Driver
# ============================================================================
[http]
base_url = "https://grades.example.edu/api"

# bearer, basic or none
auth_type = "bearer"
token = "${GRADING_API_TOKEN}"
# username = "gradeexport"
# password = "${GRADING_API_PASSWORD}"

timeout_seconds = 30

# Courses whose idnumber matches are exported through this driver
course_code_pattern = "^[A-Z]{3}[0-9]{3}"

# Host user field holding the student registration (username, idnumber, email)
user_ident_field = "idnumber"

# Grade range accepted by the service
grade_min = 0.0
grade_max = 10.0

# ============================================================================
# Report Server
# ============================================================================
[server]
host = "127.0.0.1"
port = 8080
# Acting user when requests carry no X-User-Id header
# default_user = 2

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files (daily, hourly or never rotated)
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }
}
