//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the gradeexport configuration file.

use super::{EXIT_CONFIG, EXIT_OK};
use crate::adapters::drivers::DriverRegistry;
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Err(e) = config.validate() {
            println!("❌ Configuration validation failed");
            println!("   Error: {e}");
            println!();
            return Ok(EXIT_CONFIG);
        }

        // Instantiating every enabled driver also checks its field mapping
        let registry = match DriverRegistry::with_defaults(&config) {
            Ok(r) => r,
            Err(e) => {
                println!("❌ Driver setup failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        for id in config.drivers.enabled.iter().filter(|id| registry.contains(id)) {
            if let Err(e) = registry.create(id) {
                println!("❌ Driver '{id}' is misconfigured");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        }

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Drivers: {}", config.drivers.enabled.join(", "));
        println!("  Host Snapshot: {}", config.host.snapshot_path);
        if config.drivers.is_enabled("sample") {
            println!("  Sample External Data: {}", config.sample.external_data_path);
        }
        if let Some(http) = &config.http {
            println!("  Grading Service: {}", http.base_url);
            println!("  Auth Type: {}", http.auth_type);
            println!("  Course Code Pattern: {}", http.course_code_pattern);
            println!("  Grade Range: {} - {}", http.grade_min, http.grade_max);
        }
        println!("  Server: {}", config.server.bind_address());
        println!(
            "  File Logging: {}",
            if config.logging.local_enabled {
                config.logging.local_path.as_str()
            } else {
                "disabled"
            }
        );
        println!();
        Ok(EXIT_OK)
    }
}
