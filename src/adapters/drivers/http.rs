//! REST grading service driver
//!
//! Talks to an external grading service over HTTP:
//!
//! - `GET  {base_url}/courses/{code}/grades` lists the students of a course
//!   with their current grade
//! - `POST {base_url}/courses/{code}/grades/{registration}` stores one grade
//!
//! `{code}` is the course idnumber. The driver only handles courses whose
//! idnumber matches `http.course_code_pattern`.

use super::{DriverFactory, ExportDriver};
use crate::config::HttpDriverConfig;
use crate::domain::errors::ExternalSystemError;
use crate::domain::field::{FULL_NAME, GRADE, USER_IDENT};
use crate::domain::grade::GradeType;
use crate::domain::ids::{ExternalId, UserId};
use crate::domain::strings::{self, codes};
use crate::domain::{
    Alignment, EnrolledStudent, ExternalRecord, ExternalRecords, FieldMapping, FieldSource,
    FieldSpec, FieldValue, GradeExportError, GradeItem, LocalGrade, Notification,
    ReconciliationMessage, RequestContext, Result, UserIdentField, ValueType,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use url::Url;

pub const HTTP_DRIVER_ID: &str = "http";

/// Editable flag sent along with the grade
const INSUFFICIENT_ATTENDANCE: &str = "insufficient_attendance";

/// Student entry as returned by the grading service
#[derive(Debug, Deserialize)]
struct RemoteStudent {
    registration: String,
    name: String,
    #[serde(default)]
    grade: Option<f64>,
    #[serde(default, flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RemoteGrades {
    students: Vec<RemoteStudent>,
}

#[derive(Debug, Serialize)]
struct GradeSubmission<'a> {
    grade: f64,
    fields: &'a BTreeMap<String, FieldValue>,
}

/// Driver for a REST grading service
///
/// # Example
///
/// ```no_run
/// use gradeexport::adapters::drivers::HttpDriver;
/// use gradeexport::config::HttpDriverConfig;
///
/// # fn example(config: HttpDriverConfig) -> gradeexport::domain::Result<()> {
/// let driver = HttpDriver::new(config)?;
/// # Ok(())
/// # }
/// ```
pub struct HttpDriver {
    config: HttpDriverConfig,
    client: Client,
    course_pattern: Regex,
}

impl HttpDriver {
    /// Create a new driver instance
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built or the
    /// course code pattern is not a valid regex.
    pub fn new(config: HttpDriverConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)))
            .build()
            .map_err(|e| {
                GradeExportError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        let course_pattern = Regex::new(&config.course_code_pattern).map_err(|e| {
            GradeExportError::Configuration(format!("Invalid http.course_code_pattern: {e}"))
        })?;

        Ok(Self {
            config,
            client,
            course_pattern,
        })
    }

    /// Build authorization header value
    fn auth_header_value(&self) -> Option<String> {
        match self.config.auth_type.as_str() {
            "bearer" => self
                .config
                .token
                .as_ref()
                .map(|token| format!("Bearer {}", token.expose_secret())),
            "basic" => match (&self.config.username, &self.config.password) {
                (Some(username), Some(password)) => {
                    let credentials = format!("{username}:{}", password.expose_secret());
                    let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                    Some(format!("Basic {encoded}"))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth_header_value() {
            Some(auth) => request.header("Authorization", auth),
            None => request,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            GradeExportError::Configuration(format!("Invalid http.base_url: {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                GradeExportError::Configuration("http.base_url cannot be a base URL".to_string())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn course_code<'a>(&self, ctx: &'a RequestContext) -> &'a str {
        ctx.course.idnumber.trim()
    }
}

fn request_error(err: reqwest::Error) -> GradeExportError {
    if err.is_timeout() {
        ExternalSystemError::Timeout(err.to_string()).into()
    } else {
        ExternalSystemError::ConnectionFailed(err.to_string()).into()
    }
}

/// Map non-2xx responses to typed errors
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    let err = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ExternalSystemError::AuthenticationFailed(format!("{status}: {message}"))
        }
        s if s.is_server_error() => ExternalSystemError::ServerError {
            status: s.as_u16(),
            message,
        },
        s => ExternalSystemError::ClientError {
            status: s.as_u16(),
            message,
        },
    };
    Err(err.into())
}

#[async_trait]
impl ExportDriver for HttpDriver {
    fn id(&self) -> &str {
        HTTP_DRIVER_ID
    }

    fn display_name(&self) -> String {
        format!("Grading service at {}", self.config.base_url)
    }

    fn field_mapping(&self) -> FieldMapping {
        // registration numbers are alphanumeric; usernames and emails are not
        let ident_type = match self.config.user_ident_field {
            UserIdentField::IdNumber => ValueType::AlphaNum,
            UserIdentField::Username | UserIdentField::Email => ValueType::Text,
        };
        FieldMapping::new()
            .with_field(USER_IDENT, FieldSpec::new("Registration", ident_type))
            .with_field(FULL_NAME, FieldSpec::new("Name", ValueType::Text))
            .with_field(
                GRADE,
                FieldSpec::new("Final grade", ValueType::Float).align(Alignment::Right),
            )
            .with_field(
                INSUFFICIENT_ATTENDANCE,
                FieldSpec::new("Insufficient attendance", ValueType::Bool)
                    .editable(true)
                    .align(Alignment::Center)
                    .source(FieldSource::External)
                    .default_value(FieldValue::Bool(false)),
            )
    }

    fn user_ident_field(&self) -> UserIdentField {
        self.config.user_ident_field
    }

    fn knows_how_to_send_grades(&self, ctx: &RequestContext) -> bool {
        let code = self.course_code(ctx);
        !code.is_empty() && self.course_pattern.is_match(code)
    }

    async fn course_notifications(
        &self,
        ctx: &RequestContext,
        item: &GradeItem,
    ) -> Result<Vec<Notification>> {
        let category = if item.category_name.is_empty() {
            ctx.grade_course().fullname.as_str()
        } else {
            item.category_name.as_str()
        };

        if item.grade_type != GradeType::Value {
            return Ok(vec![Notification::problem(codes::INVALID_TYPE_VALUE)
                .with_text(strings::invalid_type_value(category))]);
        }

        if item.grade_min != self.config.grade_min || item.grade_max != self.config.grade_max {
            return Ok(vec![Notification::problem(codes::INVALID_GRADE_RANGE).with_text(
                strings::invalid_grade_range(self.config.grade_min, self.config.grade_max, category),
            )]);
        }

        Ok(Vec::new())
    }

    async fn load_external_data(
        &self,
        ctx: &RequestContext,
        _students: &[EnrolledStudent],
    ) -> Result<ExternalRecords> {
        let code = self.course_code(ctx);
        let url = self.endpoint(&["courses", code, "grades"])?;

        tracing::info!(course_code = %code, url = %url, "Fetching external grades");

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(request_error)?;
        let response = check_status(response).await?;

        let remote: RemoteGrades = response.json().await.map_err(|e| {
            GradeExportError::from(ExternalSystemError::InvalidResponse(format!(
                "Failed to parse grades of course {code}: {e}"
            )))
        })?;

        let mut records = ExternalRecords::new();
        for student in remote.students {
            match ExternalId::new(&student.registration) {
                Ok(ident) => {
                    let mut record = ExternalRecord::new(ident, student.name, student.grade);
                    record.extra = student.extra;
                    records.insert(record);
                }
                Err(_) => {
                    tracing::warn!(
                        course_code = %code,
                        name = %student.name,
                        "Skipping external student without registration"
                    );
                }
            }
        }

        tracing::debug!(course_code = %code, records = records.len(), "External grades loaded");
        Ok(records)
    }

    async fn send_user_data(
        &self,
        ctx: &RequestContext,
        user: UserId,
        ident: &ExternalId,
        grade: &LocalGrade,
        fields: &BTreeMap<String, FieldValue>,
    ) -> Result<Vec<ReconciliationMessage>> {
        let code = self.course_code(ctx);
        let url = self.endpoint(&["courses", code, "grades", ident.as_str()])?;

        tracing::debug!(user_id = %user, ident = %ident, "Posting grade");

        let response = self
            .authorize(self.client.post(url))
            .json(&GradeSubmission {
                grade: grade.effective(),
                fields,
            })
            .send()
            .await
            .map_err(request_error)?;
        check_status(response).await?;

        Ok(vec![ReconciliationMessage::success(codes::GRADE_SENT)])
    }
}

/// Factory for [`HttpDriver`]
///
/// The driver is built on the first `create` and shared afterwards, so every
/// request reuses one HTTP client and its connection pool.
pub struct HttpDriverFactory {
    config: Option<HttpDriverConfig>,
    driver: OnceLock<Arc<HttpDriver>>,
}

impl HttpDriverFactory {
    pub fn new(config: Option<HttpDriverConfig>) -> Self {
        Self {
            config,
            driver: OnceLock::new(),
        }
    }
}

impl DriverFactory for HttpDriverFactory {
    fn id(&self) -> &'static str {
        HTTP_DRIVER_ID
    }

    fn create(&self) -> Result<Arc<dyn ExportDriver>> {
        if let Some(driver) = self.driver.get() {
            return Ok(driver.clone());
        }

        let config = self.config.clone().ok_or_else(|| {
            GradeExportError::Configuration(
                "http configuration is required when the 'http' driver is enabled".to_string(),
            )
        })?;
        let driver = Arc::new(HttpDriver::new(config)?);
        Ok(self.driver.get_or_init(|| driver).clone())
    }
}
