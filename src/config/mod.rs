//! Configuration management for gradeexport.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Gradeexport uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `GRADEEXPORT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Per-section validation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gradeexport::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("gradeexport.toml")?;
//!
//! println!("Drivers: {}", config.drivers.enabled.join(", "));
//! if let Some(http) = &config.http {
//!     println!("Grading service: {}", http.base_url);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`DriversConfig`] - Ordered list of enabled drivers
//! - [`HostConfig`] - Host platform snapshot
//! - [`SampleConfig`] - Sample driver fixture data
//! - [`HttpDriverConfig`] - REST grading service connection and authentication
//! - [`ServerConfig`] - Report HTTP server
//! - [`LoggingConfig`] - File logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [drivers]
//! enabled = ["http", "sample"]
//!
//! [host]
//! snapshot_path = "demos/host_snapshot.json"
//!
//! [http]
//! base_url = "https://grades.example.edu/api"
//! auth_type = "bearer"
//! token = "${GRADING_API_TOKEN}"
//! course_code_pattern = "^[A-Z]{3}[0-9]{3}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    AppConfig, ApplicationConfig, DriversConfig, HostConfig, HttpDriverConfig, LoggingConfig,
    SampleConfig, ServerConfig,
};
pub use secret::{secret_string, secret_string_opt, Credential, SecretString};
