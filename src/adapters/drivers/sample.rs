//! Sample driver
//!
//! A self-contained driver that knows every course. External records come
//! from a JSON fixture file, the `attendance` column is computed from host
//! attendance rates, and submitted grades are kept in an in-memory
//! [`SubmissionLog`]. It also offers an `export_csv` action.

use super::{
    ActionFormat, ActionOutput, DriverActions, DriverDatum, DriverFactory, ExportDriver,
    FieldDataSource,
};
use crate::adapters::host::HostPlatform;
use crate::config::SampleConfig;
use crate::core::export::ExportSession;
use crate::domain::context::ResultExt;
use crate::domain::field::{FULL_NAME, GRADE, USER_IDENT};
use crate::domain::grade::GradeType;
use crate::domain::ids::{CourseId, ExternalId, UserId};
use crate::domain::strings::{self, codes};
use crate::domain::{
    Alignment, EnrolledStudent, ExternalRecord, ExternalRecords, FieldMapping, FieldSource,
    FieldSpec, FieldValue, GradeExportError, GradeItem, LocalGrade, Notification,
    ReconciliationMessage, RequestContext, Result, ValueType,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const SAMPLE_DRIVER_ID: &str = "sample";

/// Name of the CSV download action
pub const EXPORT_CSV_ACTION: &str = "export_csv";

const ATTENDANCE: &str = "attendance";
const GRADE_MIN: f64 = 0.0;
const GRADE_MAX: f64 = 100.0;

/// A grade accepted by the sample driver
#[derive(Debug, Clone, PartialEq)]
pub struct SentGrade {
    pub course: CourseId,
    pub user: UserId,
    pub ident: ExternalId,
    pub grade: Option<f64>,
    pub fields: BTreeMap<String, FieldValue>,
    pub sent_at: DateTime<Utc>,
}

/// Entries kept by [`SubmissionLog::new`]
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Grades sent through the sample driver, shared across requests
///
/// Meant for demos and tests. Only the most recent `capacity` entries are
/// kept; older ones are dropped.
#[derive(Debug, Clone)]
pub struct SubmissionLog {
    entries: Arc<Mutex<VecDeque<SentGrade>>>,
    capacity: usize,
}

impl Default for SubmissionLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl SubmissionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    async fn record(&self, entry: SentGrade) {
        let mut entries = self.entries.lock().await;
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Oldest first
    pub async fn entries(&self) -> Vec<SentGrade> {
        self.entries.lock().await.iter().cloned().collect()
    }
}

/// Attendance column handler: the host attendance rate as a percentage
struct AttendanceHandler;

#[async_trait]
impl FieldDataSource for AttendanceHandler {
    async fn load(
        &self,
        ctx: &RequestContext,
        host: &dyn HostPlatform,
    ) -> Result<BTreeMap<UserId, DriverDatum>> {
        let rates = host.fetch_attendance(ctx.grade_course().id).await?;
        Ok(rates
            .into_iter()
            .map(|(user, rate)| {
                let pct = rate * 100.0;
                (user, DriverDatum::new(FieldValue::Float(pct), format!("{pct:.1}%")))
            })
            .collect())
    }
}

/// Sample export driver
pub struct SampleDriver {
    config: SampleConfig,
    log: SubmissionLog,
}

impl SampleDriver {
    pub fn new(config: SampleConfig, log: SubmissionLog) -> Self {
        Self { config, log }
    }

    fn csv_export(&self, session: &ExportSession) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(vec![]);

        let mut header: Vec<String> = session.mapping().iter().map(|f| f.name.clone()).collect();
        header.push(self.external_column_name());
        writer.write_record(&header)?;

        for student in session.students() {
            let grade = session.grade(student.user_id);
            let external = student.ident.as_ref().and_then(|id| session.external().get(id));

            let mut record = Vec::with_capacity(header.len());
            for field in session.mapping().iter() {
                let value = match field.key.as_str() {
                    USER_IDENT => student.ident_str().to_string(),
                    FULL_NAME => student.display_name(),
                    GRADE => session.grade_item().format(grade.final_grade),
                    key if field.source == FieldSource::Driver => session.driver_display(key, student.user_id),
                    key => external
                        .and_then(|r| r.extra(key))
                        .map(|v| FieldValue::from(v.clone()).to_string())
                        .unwrap_or_default(),
                };
                record.push(value);
            }
            record.push(self.format_external_grade(external.and_then(|r| r.grade)));
            writer.write_record(&record)?;
        }

        writer
            .into_inner()
            .map_err(|e| GradeExportError::Serialization(format!("CSV error: {e}")))
    }
}

#[async_trait]
impl ExportDriver for SampleDriver {
    fn id(&self) -> &str {
        SAMPLE_DRIVER_ID
    }

    fn display_name(&self) -> String {
        "Sample external system".to_string()
    }

    fn field_mapping(&self) -> FieldMapping {
        FieldMapping::new()
            .with_field(USER_IDENT, FieldSpec::new("Registration", ValueType::AlphaNum))
            .with_field(FULL_NAME, FieldSpec::new("Name", ValueType::Text))
            .with_field(
                ATTENDANCE,
                FieldSpec::new("Attendance", ValueType::Float)
                    .source(FieldSource::Driver)
                    .align(Alignment::Right)
                    .default_value(FieldValue::Float(0.0)),
            )
            .with_field(
                GRADE,
                FieldSpec::new("Current grade", ValueType::Float)
                    .align(Alignment::Right),
            )
    }

    fn field_handlers(&self) -> HashMap<String, Arc<dyn FieldDataSource>> {
        let mut handlers: HashMap<String, Arc<dyn FieldDataSource>> = HashMap::new();
        handlers.insert(ATTENDANCE.to_string(), Arc::new(AttendanceHandler));
        handlers
    }

    fn knows_how_to_send_grades(&self, _ctx: &RequestContext) -> bool {
        true
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

        let mut notifications = Vec::new();
        if item.grade_type == GradeType::Value {
            if item.grade_min != GRADE_MIN || item.grade_max != GRADE_MAX {
                notifications.push(
                    Notification::problem(codes::INVALID_GRADE_RANGE).with_text(
                        strings::invalid_grade_range(GRADE_MIN, GRADE_MAX, category),
                    ),
                );
            }
        } else {
            notifications.push(
                Notification::problem(codes::INVALID_TYPE_VALUE)
                    .with_text(strings::invalid_type_value(category)),
            );
        }
        Ok(notifications)
    }

    async fn load_external_data(
        &self,
        ctx: &RequestContext,
        _students: &[EnrolledStudent],
    ) -> Result<ExternalRecords> {
        let path = &self.config.external_data_path;
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read sample external data {path}"))?;
        let records: Vec<ExternalRecord> = serde_json::from_str(&json)
            .with_context(|| format!("Invalid sample external data {path}"))?;

        tracing::debug!(
            course_id = %ctx.course.id,
            records = records.len(),
            "Loaded sample external records"
        );

        Ok(records.into_iter().collect())
    }

    async fn send_user_data(
        &self,
        ctx: &RequestContext,
        user: UserId,
        ident: &ExternalId,
        grade: &LocalGrade,
        fields: &BTreeMap<String, FieldValue>,
    ) -> Result<Vec<ReconciliationMessage>> {
        self.log
            .record(SentGrade {
                course: ctx.course.id,
                user,
                ident: ident.clone(),
                grade: grade.final_grade,
                fields: fields.clone(),
                sent_at: Utc::now(),
            })
            .await;

        Ok(vec![ReconciliationMessage::success(codes::GRADE_SENT)])
    }

    fn actions(&self) -> DriverActions {
        DriverActions::new(ActionFormat::Button, Alignment::Right)
            .with_action(EXPORT_CSV_ACTION, "Export CSV")
    }

    async fn run_action(&self, name: &str, session: &ExportSession) -> Result<ActionOutput> {
        match name {
            EXPORT_CSV_ACTION => Ok(ActionOutput {
                filename: format!("{}_grades.csv", session.context().course.shortname),
                content_type: "text/csv".to_string(),
                body: self.csv_export(session)?,
            }),
            other => Err(GradeExportError::UnknownAction(other.to_string())),
        }
    }
}

/// Factory for [`SampleDriver`]; every instance shares the same log
pub struct SampleDriverFactory {
    config: SampleConfig,
    log: SubmissionLog,
}

impl SampleDriverFactory {
    pub fn new(config: SampleConfig, log: SubmissionLog) -> Self {
        Self { config, log }
    }

    pub fn log(&self) -> &SubmissionLog {
        &self.log
    }
}

impl DriverFactory for SampleDriverFactory {
    fn id(&self) -> &'static str {
        SAMPLE_DRIVER_ID
    }

    fn create(&self) -> Result<Arc<dyn ExportDriver>> {
        Ok(Arc::new(SampleDriver::new(self.config.clone(), self.log.clone())))
    }
}
