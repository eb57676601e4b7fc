//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::AppConfig;
use super::secret::secret_string;
use crate::domain::errors::GradeExportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into AppConfig
/// 4. Applies environment variable overrides (GRADEEXPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use gradeexport::config::loader::load_config;
///
/// let config = load_config("gradeexport.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(GradeExportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        GradeExportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config = parse_config(&contents)?;

    tracing::debug!(
        path = %path.display(),
        drivers = ?config.drivers.enabled,
        "Configuration loaded"
    );

    Ok(config)
}

/// Parses configuration text, applying substitution, overrides and validation
///
/// # Errors
///
/// Returns a configuration error for missing variables, bad TOML or invalid values.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: AppConfig = toml::from_str(&contents)
        .map_err(|e| GradeExportError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        GradeExportError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| GradeExportError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        lines.push(processed.into_owned());
    }

    if !missing_vars.is_empty() {
        return Err(GradeExportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Applies environment variable overrides using the GRADEEXPORT_* prefix
///
/// Environment variables follow the pattern: GRADEEXPORT_<SECTION>_<KEY>
/// For example: GRADEEXPORT_HTTP_BASE_URL, GRADEEXPORT_DRIVERS_ENABLED.
/// Values that do not parse are ignored.
fn apply_env_overrides(config: &mut AppConfig) {
    // Application overrides
    if let Some(val) = env("GRADEEXPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Driver overrides (comma separated)
    if let Some(val) = env("GRADEEXPORT_DRIVERS_ENABLED") {
        config.drivers.enabled = val
            .split(',')
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
    }

    // Host and sample driver overrides
    if let Some(val) = env("GRADEEXPORT_HOST_SNAPSHOT_PATH") {
        config.host.snapshot_path = val;
    }
    if let Some(val) = env("GRADEEXPORT_SAMPLE_EXTERNAL_DATA_PATH") {
        config.sample.external_data_path = val;
    }

    // HTTP driver overrides (only if [http] is configured)
    if let Some(ref mut http) = config.http {
        if let Some(val) = env("GRADEEXPORT_HTTP_BASE_URL") {
            http.base_url = val;
        }
        if let Some(val) = env("GRADEEXPORT_HTTP_AUTH_TYPE") {
            http.auth_type = val;
        }
        if let Some(val) = env("GRADEEXPORT_HTTP_TOKEN") {
            http.token = Some(secret_string(val));
        }
        if let Some(val) = env("GRADEEXPORT_HTTP_USERNAME") {
            http.username = Some(val);
        }
        if let Some(val) = env("GRADEEXPORT_HTTP_PASSWORD") {
            http.password = Some(secret_string(val));
        }
        if let Some(timeout) = env("GRADEEXPORT_HTTP_TIMEOUT_SECONDS").and_then(|v| v.parse().ok())
        {
            http.timeout_seconds = timeout;
        }
        if let Some(val) = env("GRADEEXPORT_HTTP_COURSE_CODE_PATTERN") {
            http.course_code_pattern = val;
        }
    }

    // Server overrides
    if let Some(val) = env("GRADEEXPORT_SERVER_HOST") {
        config.server.host = val;
    }
    if let Some(port) = env("GRADEEXPORT_SERVER_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = port;
    }
    if let Some(user) = env("GRADEEXPORT_SERVER_DEFAULT_USER").and_then(|v| v.parse().ok()) {
        config.server.default_user = Some(user);
    }

    // Logging overrides
    if let Some(enabled) = env("GRADEEXPORT_LOGGING_LOCAL_ENABLED").and_then(|v| v.parse().ok()) {
        config.logging.local_enabled = enabled;
    }
    if let Some(val) = env("GRADEEXPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env("GRADEEXPORT_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("GRADEEXPORT_LOADER_TEST_TOKEN", "test_value");
        let input = "token = \"${GRADEEXPORT_LOADER_TEST_TOKEN}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "token = \"test_value\"");
        std::env::remove_var("GRADEEXPORT_LOADER_TEST_TOKEN");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("GRADEEXPORT_LOADER_MISSING_VAR");
        let input = "password = \"${GRADEEXPORT_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("GRADEEXPORT_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("GRADEEXPORT_LOADER_COMMENTED");
        let input = "# token = \"${GRADEEXPORT_LOADER_COMMENTED}\"\nport = 8080";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${GRADEEXPORT_LOADER_COMMENTED}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(GradeExportError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[drivers]
enabled = ["http", "sample"]

[host]
snapshot_path = "/data/host.json"

[http]
base_url = "https://grades.example.edu/api"
auth_type = "basic"
username = "svc"
password = "secret"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.drivers.enabled, vec!["http", "sample"]);
        assert_eq!(config.host.snapshot_path, "/data/host.json");
        let http = config.http.unwrap();
        assert_eq!(http.timeout_seconds, 30);
        assert_eq!(http.username.as_deref(), Some("svc"));
    }

    #[test]
    fn test_parse_config_invalid_toml() {
        let err = parse_config("[drivers\nenabled = 3").unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }

    #[test]
    fn test_parse_config_validation_failure() {
        let err = parse_config("[server]\nport = 0\n").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("server.port"));
    }
}
