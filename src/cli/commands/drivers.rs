//! Drivers command implementation
//!
//! Lists the registered drivers, their selection order and whether each can
//! be built from the current configuration.

use super::{load_checked, EXIT_CONFIG, EXIT_OK};
use crate::adapters::drivers::DriverRegistry;
use clap::Args;

/// Arguments for the drivers command
#[derive(Args, Debug)]
pub struct DriversArgs {}

impl DriversArgs {
    /// Execute the drivers command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let Some(config) = load_checked(config_path) else {
            return Ok(EXIT_CONFIG);
        };
        let registry = DriverRegistry::with_defaults(&config)?;

        println!("Registered drivers:");
        for id in registry.ids() {
            let position = config.drivers.enabled.iter().position(|d| d == id);
            let status = match (position, registry.create(id)) {
                (None, _) => "disabled".to_string(),
                (Some(i), Ok(Some(driver))) => format!("enabled #{} ({})", i + 1, driver.display_name()),
                (Some(i), Ok(None)) => format!("enabled #{}", i + 1),
                (Some(_), Err(e)) => format!("invalid: {e}"),
            };
            println!("  {id:<10} {status}");
        }

        for id in config.drivers.enabled.iter().filter(|id| !registry.contains(id)) {
            println!("  {id:<10} unknown, skipped during selection");
        }

        Ok(EXIT_OK)
    }
}
