//! Export driver trait definition
//!
//! This module defines the `ExportDriver` trait that abstracts the external
//! grading systems gradeexport can send grades to. A driver declares its field
//! mapping, loads the external records of a course, reconciles each student
//! and submits one student at a time. Everything else (loading students and
//! grades, permissions, the send loop) lives in
//! [`ExportSession`](crate::core::export::ExportSession).

use crate::adapters::host::HostPlatform;
use crate::core::export::reconcile;
use crate::core::export::ExportSession;
use crate::domain::field::FieldSource;
use crate::domain::ids::{ExternalId, UserId};
use crate::domain::{
    Alignment, EnrolledStudent, ExternalRecord, ExternalRecords, FieldMapping, FieldValue,
    GradeExportError, GradeItem, LocalGrade, MergedFieldMapping, Notification,
    ReconciliationMessage, RequestContext, Result, UserIdentField,
};
use crate::domain::strings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Value a driver handler computed for one student and one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverDatum {
    /// Raw value, sent back to the external system
    pub value: FieldValue,

    /// Formatted value shown in the report
    pub display: String,
}

impl DriverDatum {
    pub fn new(value: FieldValue, display: impl Into<String>) -> Self {
        Self {
            value,
            display: display.into(),
        }
    }
}

/// Data handler for a driver-sourced field
#[async_trait]
pub trait FieldDataSource: Send + Sync {
    /// Load the field value of every student the handler knows about
    async fn load(
        &self,
        ctx: &RequestContext,
        host: &dyn HostPlatform,
    ) -> Result<BTreeMap<UserId, DriverDatum>>;
}

/// How driver actions are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionFormat {
    #[default]
    Button,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverAction {
    pub name: String,
    pub label: String,
}

/// Actions a driver offers above the report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverActions {
    pub format: ActionFormat,
    pub align: Alignment,
    pub actions: Vec<DriverAction>,
}

impl DriverActions {
    pub fn new(format: ActionFormat, align: Alignment) -> Self {
        Self {
            format,
            align,
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.actions.push(DriverAction {
            name: name.into(),
            label: label.into(),
        });
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.iter().any(|a| a.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Output of a driver action, usually a file download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutput {
    pub filename: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Trait for external grading system drivers
///
/// # Example
///
/// ```no_run
/// use gradeexport::adapters::drivers::{DriverRegistry, ExportDriver};
/// use gradeexport::config::AppConfig;
/// use gradeexport::domain::RequestContext;
///
/// # fn example(config: &AppConfig, ctx: &RequestContext) -> gradeexport::domain::Result<()> {
/// let registry = DriverRegistry::with_defaults(config)?;
/// if let Some(driver) = registry.select(&config.drivers.enabled, ctx)? {
///     println!("Exporting with {}", driver.display_name());
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ExportDriver: Send + Sync {
    /// Registry identifier of the driver
    fn id(&self) -> &str;

    /// Human readable driver name
    fn display_name(&self) -> String {
        self.id().to_string()
    }

    /// Columns shown in the report and data sent to the external system
    ///
    /// Must declare `userident`, `fullname` and `grade`.
    fn field_mapping(&self) -> FieldMapping;

    /// Data handlers for the fields whose source is [`FieldSource::Driver`]
    fn field_handlers(&self) -> HashMap<String, Arc<dyn FieldDataSource>> {
        HashMap::new()
    }

    /// Host user field holding the external identifier
    fn user_ident_field(&self) -> UserIdentField {
        UserIdentField::Username
    }

    /// Whether the driver handles the course of the request
    fn knows_how_to_send_grades(&self, _ctx: &RequestContext) -> bool {
        false
    }

    /// Course-level checks appended to the base permission checks
    ///
    /// Any problem notification makes the whole report read-only.
    async fn course_notifications(
        &self,
        _ctx: &RequestContext,
        _item: &GradeItem,
    ) -> Result<Vec<Notification>> {
        Ok(Vec::new())
    }

    /// Load the external records of the course
    ///
    /// # Errors
    ///
    /// Any error aborts the request; there is no retry.
    async fn load_external_data(
        &self,
        ctx: &RequestContext,
        students: &[EnrolledStudent],
    ) -> Result<ExternalRecords>;

    /// Compare a local grade with the external record of the same student
    fn check_grade(
        &self,
        local: &LocalGrade,
        external: Option<&ExternalRecord>,
    ) -> Vec<ReconciliationMessage> {
        reconcile::check_grade(local, external)
    }

    /// Submit one student's grade and editable field values
    ///
    /// Returns the messages to show in the student's row. An error becomes a
    /// single error message for that student; the batch carries on.
    async fn send_user_data(
        &self,
        ctx: &RequestContext,
        user: UserId,
        ident: &ExternalId,
        grade: &LocalGrade,
        fields: &BTreeMap<String, FieldValue>,
    ) -> Result<Vec<ReconciliationMessage>>;

    fn title_header(&self) -> String {
        strings::TITLE_HEADER.to_string()
    }

    fn external_column_name(&self) -> String {
        strings::EXTERNAL.to_string()
    }

    fn format_external_grade(&self, grade: Option<f64>) -> String {
        match grade {
            Some(value) => format!("{value:.2}"),
            None => "-".to_string(),
        }
    }

    fn actions(&self) -> DriverActions {
        DriverActions::default()
    }

    /// Run a declared action against a populated session
    ///
    /// The session checks the action is declared before calling this.
    async fn run_action(&self, name: &str, _session: &ExportSession) -> Result<ActionOutput> {
        Err(GradeExportError::UnknownAction(name.to_string()))
    }
}

impl std::fmt::Debug for dyn ExportDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportDriver").field("id", &self.id()).finish()
    }
}

/// Builds driver instances for the registry
pub trait DriverFactory: Send + Sync {
    fn id(&self) -> &'static str;

    /// Instantiate a driver
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the driver settings are unusable.
    fn create(&self) -> Result<Arc<dyn ExportDriver>>;
}

/// Merge a driver's field mapping and check every driver-sourced field has a handler
///
/// # Errors
///
/// Returns [`GradeExportError::MandatoryField`] or
/// [`GradeExportError::MissingFieldHandler`].
pub fn validate_driver(driver: &dyn ExportDriver) -> Result<MergedFieldMapping> {
    let merged = driver.field_mapping().merge()?;
    let handlers = driver.field_handlers();

    for field in merged.iter().filter(|f| f.source == FieldSource::Driver) {
        if !handlers.contains_key(&field.key) {
            return Err(GradeExportError::MissingFieldHandler {
                field: field.key.clone(),
                driver: driver.id().to_string(),
            });
        }
    }

    Ok(merged)
}
