//! Configuration schema types
//!
//! This module defines the configuration structure for gradeexport.

use crate::config::SecretString;
use crate::domain::UserIdentField;
use serde::{Deserialize, Serialize};

/// Main gradeexport configuration
///
/// This is the root configuration structure that maps to the TOML file.
/// Every section is optional; `[http]` becomes mandatory once the `http`
/// driver is enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Driver selection
    #[serde(default)]
    pub drivers: DriversConfig,

    /// Host platform data source
    #[serde(default)]
    pub host: HostConfig,

    /// Sample driver settings
    #[serde(default)]
    pub sample: SampleConfig,

    /// REST grading service driver settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpDriverConfig>,

    /// Report HTTP server
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.drivers.validate()?;
        self.host.validate()?;
        self.sample.validate()?;

        if self.drivers.is_enabled("http") {
            match self.http {
                Some(ref http) => http.validate()?,
                None => {
                    return Err(
                        "http configuration is required when the 'http' driver is enabled"
                            .to_string(),
                    )
                }
            }
        }

        self.server.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Driver selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriversConfig {
    /// Driver identifiers, asked in order; the first that knows the course wins
    #[serde(default = "default_enabled_drivers")]
    pub enabled: Vec<String>,
}

impl DriversConfig {
    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.iter().any(|d| d == id)
    }

    fn validate(&self) -> Result<(), String> {
        if self.enabled.iter().any(|d| d.trim().is_empty()) {
            return Err("drivers.enabled cannot contain empty identifiers".to_string());
        }
        Ok(())
    }
}

impl Default for DriversConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_drivers(),
        }
    }
}

/// Host platform data source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// JSON snapshot served by the in-memory host
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

impl HostConfig {
    fn validate(&self) -> Result<(), String> {
        if self.snapshot_path.is_empty() {
            return Err("host.snapshot_path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

/// Sample driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleConfig {
    /// JSON list of external records served by the sample driver
    #[serde(default = "default_external_data_path")]
    pub external_data_path: String,
}

impl SampleConfig {
    fn validate(&self) -> Result<(), String> {
        if self.external_data_path.is_empty() {
            return Err("sample.external_data_path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            external_data_path: default_external_data_path(),
        }
    }
}

/// REST grading service driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpDriverConfig {
    /// Base URL of the grading service
    pub base_url: String,

    /// Authentication type (bearer, basic, none)
    #[serde(default = "default_auth_type")]
    pub auth_type: String,

    /// Bearer token
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub token: Option<SecretString>,

    /// Username for basic authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic authentication
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Courses whose idnumber matches this regex are handled by the driver
    #[serde(default = "default_course_code_pattern")]
    pub course_code_pattern: String,

    /// Host user field holding the student's registration in the service
    #[serde(default = "default_http_user_field")]
    pub user_ident_field: UserIdentField,

    /// Grade range accepted by the service
    #[serde(default)]
    pub grade_min: f64,

    #[serde(default = "default_http_grade_max")]
    pub grade_max: f64,
}

impl HttpDriverConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("http.base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("http.base_url must start with http:// or https://".to_string());
        }

        let secret_missing = |secret: &Option<SecretString>| {
            secret
                .as_ref()
                .map(|s| s.expose_secret().is_empty())
                .unwrap_or(true)
        };

        match self.auth_type.as_str() {
            "bearer" => {
                if secret_missing(&self.token) {
                    return Err("http.token cannot be empty when auth_type is 'bearer'".to_string());
                }
            }
            "basic" => {
                if self.username.as_ref().map(|s| s.is_empty()).unwrap_or(true) {
                    return Err(
                        "http.username cannot be empty when auth_type is 'basic'".to_string()
                    );
                }
                if secret_missing(&self.password) {
                    return Err(
                        "http.password cannot be empty when auth_type is 'basic'".to_string()
                    );
                }
            }
            "none" => {}
            other => {
                return Err(format!(
                    "Invalid http.auth_type '{other}'. Must be one of: bearer, basic, none"
                ))
            }
        }

        if self.timeout_seconds == 0 || self.timeout_seconds > 300 {
            return Err(format!(
                "http.timeout_seconds must be between 1 and 300, got {}",
                self.timeout_seconds
            ));
        }

        regex::Regex::new(&self.course_code_pattern)
            .map_err(|e| format!("http.course_code_pattern is not a valid regex: {e}"))?;

        if self.grade_min >= self.grade_max {
            return Err(format!(
                "http.grade_min ({}) must be lower than http.grade_max ({})",
                self.grade_min, self.grade_max
            ));
        }

        Ok(())
    }
}

/// Report HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Acting user when a request carries no `X-User-Id` header
    #[serde(default)]
    pub default_user: Option<u64>,
}

impl ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("server.host cannot be empty".to_string());
        }
        if self.port == 0 {
            return Err("server.port must be > 0".to_string());
        }
        if self.default_user == Some(0) {
            return Err("server.default_user must be a valid user id".to_string());
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            default_user: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_enabled_drivers() -> Vec<String> {
    vec!["sample".to_string()]
}

fn default_snapshot_path() -> String {
    "demos/host_snapshot.json".to_string()
}

fn default_external_data_path() -> String {
    "demos/external_grades.json".to_string()
}

fn default_auth_type() -> String {
    "bearer".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_course_code_pattern() -> String {
    "^[A-Z]{3}[0-9]{3}".to_string()
}

fn default_http_user_field() -> UserIdentField {
    UserIdentField::IdNumber
}

fn default_http_grade_max() -> f64 {
    10.0
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn http_config() -> HttpDriverConfig {
        HttpDriverConfig {
            base_url: "https://grades.example.edu/api".to_string(),
            auth_type: "bearer".to_string(),
            token: Some(secret_string("tok".to_string())),
            username: None,
            password: None,
            timeout_seconds: 30,
            course_code_pattern: default_course_code_pattern(),
            user_ident_field: UserIdentField::IdNumber,
            grade_min: 0.0,
            grade_max: 10.0,
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
        };

        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.drivers.enabled, vec!["sample"]);
        assert!(config.http.is_none());
    }

    #[test]
    fn test_http_section_required_when_enabled() {
        let mut config = AppConfig::default();
        config.drivers.enabled = vec!["http".to_string(), "sample".to_string()];

        let err = config.validate().unwrap_err();
        assert!(err.contains("http configuration is required"));

        config.http = Some(http_config());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_http_config_validation() {
        let mut config = http_config();
        assert!(config.validate().is_ok());

        config.token = None;
        assert!(config.validate().is_err());

        config.auth_type = "basic".to_string();
        config.username = Some("svc".to_string());
        assert!(config.validate().unwrap_err().contains("http.password"));

        config.password = Some(secret_string("pw".to_string()));
        assert!(config.validate().is_ok());

        config.auth_type = "oauth".to_string();
        assert!(config.validate().is_err());

        config.auth_type = "none".to_string();
        config.base_url = "ftp://grades.example.edu".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_config_rejects_bad_pattern_and_range() {
        let mut config = http_config();
        config.course_code_pattern = "([A-Z".to_string();
        assert!(config
            .validate()
            .unwrap_err()
            .contains("course_code_pattern"));

        let mut config = http_config();
        config.grade_min = 10.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_config_validation() {
        let mut config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "127.0.0.1:8080");

        config.port = 0;
        assert!(config.validate().is_err());

        config.port = 8080;
        config.default_user = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.local_enabled);
        assert_eq!(config.local_path, "./logs");
        assert_eq!(config.local_rotation, "daily");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_rotation_validation() {
        let mut config = LoggingConfig::default();
        config.local_rotation = "size".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_auth_type(), "bearer");
        assert_eq!(default_timeout_seconds(), 30);
        assert_eq!(default_server_port(), 8080);
        assert_eq!(default_enabled_drivers(), vec!["sample".to_string()]);
    }
}
