//! CLI command implementations
//!
//! This module contains all CLI command implementations and the request
//! arguments they share.

pub mod action;
pub mod drivers;
pub mod init;
pub mod report;
pub mod send;
pub mod serve;
pub mod validate;

use crate::config::{load_config, AppConfig};
use crate::core::export::{ExportCoordinator, ExportRequest};
use crate::domain::ids::{CourseId, GroupId, UserId};
use crate::domain::{ExternalSystemError, GradeExportError, StudentOrder};
use clap::Args;

/// Exit code: success
pub const EXIT_OK: i32 = 0;
/// Exit code: some students could not be sent
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code: configuration error
pub const EXIT_CONFIG: i32 = 2;
/// Exit code: external system unreachable
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code: anything else
pub const EXIT_FATAL: i32 = 5;

/// Course, user and view options shared by the request commands
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Course id
    #[arg(long)]
    pub course: u64,

    /// Acting user id
    #[arg(long, env = "GRADEEXPORT_USER")]
    pub user: u64,

    /// Group id (0 = all participants)
    #[arg(long)]
    pub group: Option<u64>,

    /// Affiliated course id of a grouping course
    #[arg(long)]
    pub affiliated: Option<u64>,

    /// Student order (fullname, userident)
    #[arg(long)]
    pub order_by: Option<String>,

    /// Only list students with an active enrolment
    #[arg(long)]
    pub active_only: bool,
}

impl RequestArgs {
    pub fn user_id(&self) -> anyhow::Result<UserId> {
        UserId::new(self.user).map_err(anyhow::Error::msg)
    }

    /// Base request for these arguments
    pub fn to_request(&self) -> anyhow::Result<ExportRequest> {
        let course = CourseId::new(self.course).map_err(anyhow::Error::msg)?;
        let group = match self.group {
            Some(0) | None => None,
            Some(id) => Some(GroupId::new(id).map_err(anyhow::Error::msg)?),
        };
        let affiliated = match self.affiliated {
            Some(0) | None => None,
            Some(id) => Some(CourseId::new(id).map_err(anyhow::Error::msg)?),
        };

        let mut request = ExportRequest::new(course)
            .with_group(group)
            .with_affiliated_course(affiliated)
            .with_order(
                self.order_by
                    .as_deref()
                    .map(StudentOrder::from_param)
                    .unwrap_or_default(),
            );
        request.active_only = self.active_only;
        Ok(request)
    }
}

/// Load and validate the configuration, printing the problem on failure
pub fn load_checked(config_path: &str) -> Option<AppConfig> {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, config_path = %config_path, "Failed to load configuration");
            eprintln!("❌ Failed to load configuration file: {e}");
            return None;
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Configuration validation failed");
        eprintln!("❌ Configuration validation failed: {e}");
        return None;
    }
    Some(config)
}

/// Build a coordinator, printing the problem on failure
pub fn coordinator(config: &AppConfig) -> Result<ExportCoordinator, i32> {
    ExportCoordinator::from_config(config).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize export");
        eprintln!("❌ Failed to initialize export: {e}");
        exit_code_for(&e)
    })
}

/// Exit code of a failed command
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<GradeExportError>()
        .map(exit_code_for)
        .unwrap_or(EXIT_FATAL)
}

/// Exit code of a domain error
pub fn exit_code_for(err: &GradeExportError) -> i32 {
    match err {
        e if e.is_configuration() => EXIT_CONFIG,
        GradeExportError::ExternalSystem(
            ExternalSystemError::ConnectionFailed(_) | ExternalSystemError::Timeout(_),
        ) => EXIT_CONNECTION,
        _ => EXIT_FATAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let config = GradeExportError::Configuration("bad".to_string());
        assert_eq!(exit_code_for(&config), EXIT_CONFIG);
        assert_eq!(
            exit_code_for(&GradeExportError::MandatoryField("grade".to_string())),
            EXIT_CONFIG
        );

        let timeout = GradeExportError::from(ExternalSystemError::Timeout("30s".to_string()));
        assert_eq!(exit_code_for(&timeout), EXIT_CONNECTION);

        let anyhow_err = anyhow::Error::from(GradeExportError::NotFound("course 9".to_string()));
        assert_eq!(exit_code(&anyhow_err), EXIT_FATAL);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), EXIT_FATAL);
    }

    #[test]
    fn test_request_args() {
        let args = RequestArgs {
            course: 2,
            user: 7,
            group: Some(0),
            affiliated: Some(4),
            order_by: Some("userident".to_string()),
            active_only: true,
        };
        let request = args.to_request().unwrap();
        assert_eq!(request.group_id, None);
        assert_eq!(request.affiliated_course_id, Some(CourseId::new(4).unwrap()));
        assert_eq!(request.order_by, StudentOrder::UserIdent);
        assert!(request.active_only);

        let bad = RequestArgs { course: 0, ..args };
        assert!(bad.to_request().is_err());
    }
}
