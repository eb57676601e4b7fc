//! Export session
//!
//! An [`ExportSession`] binds a selected driver to one request. It holds the
//! base behaviour every driver shares: permission checks, loading students,
//! local grades, external records and driver-computed fields, reconciliation,
//! and the per-student send loop.

use super::batch::{BatchProcessor, SubmissionItem};
use super::reconcile::{self, StudentReconciliation};
use super::summary::SubmissionOutcome;
use crate::adapters::drivers::{validate_driver, ActionOutput, DriverDatum, ExportDriver};
use crate::adapters::host::{capabilities, HostPlatform};
use crate::domain::field::USER_IDENT;
use crate::domain::ids::{ExternalId, GroupId, UserId};
use crate::domain::strings::codes;
use crate::domain::student::sort_students;
use crate::domain::{
    EnrolledStudent, ExternalRecords, FieldValue, GradeExportError, GradeItem, LocalGrade,
    MergedFieldMapping, Notification, RequestContext, Result,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Submitted editable field values: field name → user → raw text
pub type SubmittedFields = HashMap<String, HashMap<UserId, String>>;

/// One driver bound to one request
pub struct ExportSession {
    ctx: RequestContext,
    driver: Arc<dyn ExportDriver>,
    host: Arc<dyn HostPlatform>,
    mapping: MergedFieldMapping,
    grade_item: GradeItem,
    students: Vec<EnrolledStudent>,
    grades: HashMap<UserId, LocalGrade>,
    external: ExternalRecords,
    driver_data: BTreeMap<String, BTreeMap<UserId, DriverDatum>>,
}

impl ExportSession {
    /// Bind a driver to a request
    ///
    /// # Errors
    ///
    /// Fails when the driver's field mapping is invalid or the grade course
    /// has no final grade item.
    pub async fn new(
        ctx: RequestContext,
        driver: Arc<dyn ExportDriver>,
        host: Arc<dyn HostPlatform>,
    ) -> Result<Self> {
        let mapping = validate_driver(driver.as_ref())?;
        let grade_item = host.fetch_course_grade_item(ctx.grade_course().id).await?;

        Ok(Self {
            ctx,
            driver,
            host,
            mapping,
            grade_item,
            students: Vec::new(),
            grades: HashMap::new(),
            external: ExternalRecords::new(),
            driver_data: BTreeMap::new(),
        })
    }

    /// Narrow the session to a group; must happen before [`populate`](Self::populate)
    pub fn with_group(mut self, group: Option<GroupId>) -> Self {
        self.ctx.group = group;
        self
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    pub fn driver(&self) -> &Arc<dyn ExportDriver> {
        &self.driver
    }

    pub fn mapping(&self) -> &MergedFieldMapping {
        &self.mapping
    }

    pub fn grade_item(&self) -> &GradeItem {
        &self.grade_item
    }

    /// Enrolled students in display order; empty until [`populate`](Self::populate)
    pub fn students(&self) -> &[EnrolledStudent] {
        &self.students
    }

    pub fn external(&self) -> &ExternalRecords {
        &self.external
    }

    /// Local grade of a student; an empty grade when none was loaded
    pub fn grade(&self, user: UserId) -> LocalGrade {
        self.grades
            .get(&user)
            .cloned()
            .unwrap_or_else(|| LocalGrade::empty(user))
    }

    pub fn driver_datum(&self, field: &str, user: UserId) -> Option<&DriverDatum> {
        self.driver_data.get(field).and_then(|data| data.get(&user))
    }

    /// Display text of a driver-sourced field, `-` when the handler had no value
    pub fn driver_display(&self, field: &str, user: UserId) -> String {
        self.driver_datum(field, user)
            .map(|datum| datum.display.clone())
            .unwrap_or_else(|| "-".to_string())
    }

    /// Raw value of a driver-sourced field, the field default when missing
    pub fn driver_value(&self, field: &str, user: UserId) -> FieldValue {
        match self.driver_datum(field, user) {
            Some(datum) => datum.value.clone(),
            None => self
                .mapping
                .get(field)
                .map(|f| f.default.clone())
                .unwrap_or_default(),
        }
    }

    /// Whether the acting user may see the grades of the course
    pub async fn can_view_grades(&self) -> Result<bool> {
        self.host
            .has_capability(capabilities::VIEW, self.ctx.course.id, self.ctx.user)
            .await
    }

    /// Course-level notifications; any problem makes the course read-only
    ///
    /// The base check needs both the export and publish capabilities; the
    /// driver appends its own course checks.
    pub async fn can_send_grades(&self) -> Result<Vec<Notification>> {
        let course = self.ctx.course.id;
        let user = self.ctx.user;

        let mut notifications = Vec::new();
        let can_export = self
            .host
            .has_capability(capabilities::EXPORT, course, user)
            .await?;
        let can_publish = self
            .host
            .has_capability(capabilities::PUBLISH, course, user)
            .await?;
        if !(can_export && can_publish) {
            notifications.push(Notification::problem(codes::CANNOT_SEND_GRADES));
        }

        notifications.extend(
            self.driver
                .course_notifications(&self.ctx, &self.grade_item)
                .await?,
        );
        Ok(notifications)
    }

    /// Load everything the report needs
    ///
    /// Students (sorted by the requested order), local grades, external
    /// records and every driver-sourced field.
    pub async fn populate(&mut self) -> Result<()> {
        let users = self
            .host
            .fetch_enrolled(self.ctx.course.id, self.ctx.group, self.ctx.active_only)
            .await?;

        let ident_field = self.driver.user_ident_field();
        let mut students: Vec<EnrolledStudent> = users
            .iter()
            .map(|user| EnrolledStudent::from_host_user(user, ident_field))
            .collect();
        sort_students(&mut students, self.ctx.order);
        self.students = students;

        self.grades = self.load_local_grades(None).await?;
        self.external = self
            .driver
            .load_external_data(&self.ctx, &self.students)
            .await?;

        let handlers = self.driver.field_handlers();
        for field in self.mapping.driver_sourced() {
            let handler = handlers.get(&field.key).ok_or_else(|| {
                GradeExportError::MissingFieldHandler {
                    field: field.key.clone(),
                    driver: self.driver.id().to_string(),
                }
            })?;
            let data = handler.load(&self.ctx, self.host.as_ref()).await?;
            self.driver_data.insert(field.key.clone(), data);
        }

        tracing::debug!(
            course_id = %self.ctx.course.id,
            driver = self.driver.id(),
            students = self.students.len(),
            grades = self.grades.len(),
            external = self.external.len(),
            "Export session populated"
        );

        Ok(())
    }

    /// Load final grades of the grade course
    ///
    /// An explicit id list wins (an empty list loads nothing). Otherwise the
    /// whole course is loaded, or only the loaded students when a group is
    /// selected.
    pub async fn load_local_grades(
        &self,
        user_ids: Option<&[UserId]>,
    ) -> Result<HashMap<UserId, LocalGrade>> {
        let ids: Option<Vec<UserId>> = match user_ids {
            Some(ids) => Some(ids.to_vec()),
            None if self.ctx.group.is_some() => {
                Some(self.students.iter().map(|s| s.user_id).collect())
            }
            None => None,
        };

        match ids {
            Some(ids) if ids.is_empty() => Ok(HashMap::new()),
            Some(ids) => self.host.fetch_grades(&self.grade_item, Some(&ids)).await,
            None => self.host.fetch_grades(&self.grade_item, None).await,
        }
    }

    /// Pair enrolled students with external records
    ///
    /// Matched records are flagged, so [`ExternalRecords::unmatched`] lists
    /// the external students not enrolled locally afterwards.
    pub fn reconcile(&mut self) -> Vec<StudentReconciliation> {
        reconcile::reconcile(
            self.driver.as_ref(),
            &self.students,
            &self.grades,
            &mut self.external,
        )
    }

    /// Send the selected students' grades
    ///
    /// Identifiers are cleaned like the identifier field; those left empty
    /// are dropped. Grades are reloaded for exactly the selected ids.
    /// Editable fields take the submitted value, or the field default when
    /// none was submitted.
    pub async fn send_data(
        &self,
        selected: &[(UserId, ExternalId)],
        fields: &SubmittedFields,
    ) -> Result<SubmissionOutcome> {
        let selected: Vec<(UserId, ExternalId)> = selected
            .iter()
            .filter_map(|(user, ident)| match self.clean_ident(ident) {
                Some(cleaned) => Some((*user, cleaned)),
                None => {
                    tracing::warn!(
                        user_id = %user,
                        ident = ident.as_str(),
                        "Dropping unusable identifier"
                    );
                    None
                }
            })
            .collect();
        let ids: Vec<UserId> = selected.iter().map(|(user, _)| *user).collect();
        let grades = self.load_local_grades(Some(&ids)).await?;

        let items = selected
            .into_iter()
            .map(|(user, ident)| {
                let values = self
                    .mapping
                    .editable()
                    .map(|field| {
                        let raw = fields
                            .get(&field.key)
                            .and_then(|by_user| by_user.get(&user))
                            .map(String::as_str);
                        (field.key.clone(), field.clean(raw))
                    })
                    .collect();

                SubmissionItem {
                    user_id: user,
                    external_id: ident,
                    grade: grades
                        .get(&user)
                        .cloned()
                        .unwrap_or_else(|| LocalGrade::empty(user)),
                    fields: values,
                }
            })
            .collect();

        Ok(BatchProcessor::new(self.driver.clone())
            .process_batch(&self.ctx, items)
            .await)
    }

    /// Clean a submitted identifier with the identifier field's value type
    fn clean_ident(&self, ident: &ExternalId) -> Option<ExternalId> {
        let cleaned = match self.mapping.get(USER_IDENT) {
            Some(field) => field.clean(Some(ident.as_str())).to_string(),
            None => ident.as_str().trim().to_string(),
        };
        ExternalId::new(cleaned).ok()
    }

    /// Run a driver action against the populated session
    ///
    /// # Errors
    ///
    /// Returns [`GradeExportError::UnknownAction`] when the driver does not
    /// declare `name`.
    pub async fn run_action(&self, name: &str) -> Result<ActionOutput> {
        if !self.driver.actions().contains(name) {
            return Err(GradeExportError::UnknownAction(name.to_string()));
        }

        tracing::info!(driver = self.driver.id(), action = name, "Running driver action");
        self.driver.run_action(name, self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::drivers::{SampleDriver, SubmissionLog};
    use crate::adapters::host::{HostSnapshot, InMemoryHost};
    use crate::config::SampleConfig;
    use crate::domain::ids::CourseId;
    use crate::domain::StudentOrder;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SNAPSHOT: &str = r#"{
        "courses": [{"id": 2, "shortname": "MAT101", "fullname": "Calculus I"}],
        "users": [
            {"id": 10, "username": "u1", "firstname": "Ana", "lastname": "Silva"},
            {"id": 11, "username": "u2", "firstname": "Bruno", "lastname": "Costa"},
            {"id": 12, "username": "", "firstname": "Carla", "lastname": "Dias"}
        ],
        "enrolments": [
            {"course": 2, "user": 10},
            {"course": 2, "user": 11},
            {"course": 2, "user": 12}
        ],
        "groups": [{"id": 5, "course_id": 2, "name": "A", "members": [11]}],
        "grade_items": [{"id": 100, "course_id": 2}],
        "grades": [
            {"item_id": 100, "user_id": 10, "final_grade": 70.0},
            {"item_id": 100, "user_id": 11}
        ],
        "grants": [
            {"user": 7, "course": 2, "capabilities": ["gradeexport:view", "grade:export"]}
        ],
        "attendance": [{"course": 2, "user": 10, "rate": 0.75}]
    }"#;

    const EXTERNAL: &str = r#"[
        {"ident": "u1", "fullname": "Ana Silva", "grade": 70},
        {"ident": "u3", "fullname": "William Forrester", "grade": 90}
    ]"#;

    struct Fixture {
        _external: NamedTempFile,
        log: SubmissionLog,
        driver: Arc<dyn ExportDriver>,
        host: Arc<dyn HostPlatform>,
    }

    fn fixture() -> Fixture {
        let mut external = NamedTempFile::new().unwrap();
        external.write_all(EXTERNAL.as_bytes()).unwrap();

        let log = SubmissionLog::new();
        let driver = Arc::new(SampleDriver::new(
            SampleConfig {
                external_data_path: external.path().to_string_lossy().to_string(),
            },
            log.clone(),
        ));
        let host = Arc::new(InMemoryHost::new(HostSnapshot::from_json(SNAPSHOT).unwrap()));

        Fixture {
            _external: external,
            log,
            driver,
            host,
        }
    }

    fn ctx() -> RequestContext {
        let course = crate::domain::Course {
            id: CourseId::new(2).unwrap(),
            shortname: "MAT101".to_string(),
            fullname: "Calculus I".to_string(),
            idnumber: String::new(),
        };
        RequestContext::new(course, UserId::new(7).unwrap()).with_order(StudentOrder::FullName)
    }

    fn uid(id: u64) -> UserId {
        UserId::new(id).unwrap()
    }

    async fn session(fx: &Fixture, ctx: RequestContext) -> ExportSession {
        ExportSession::new(ctx, fx.driver.clone(), fx.host.clone())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_populate_and_reconcile() {
        let fx = fixture();
        let mut session = session(&fx, ctx()).await;
        session.populate().await.unwrap();

        let names: Vec<String> = session.students().iter().map(|s| s.display_name()).collect();
        assert_eq!(names, vec!["Ana Silva", "Bruno Costa", "Carla Dias"]);
        assert_eq!(session.driver_display("attendance", uid(10)), "75.0%");
        assert_eq!(session.driver_display("attendance", uid(11)), "-");
        assert_eq!(session.driver_value("attendance", uid(11)), FieldValue::Float(0.0));

        let rows = session.reconcile();
        let codes_of = |i: usize| -> Vec<String> {
            rows[i].messages.iter().map(|m| m.code.clone()).collect()
        };

        assert!(codes_of(0).is_empty());
        assert!(rows[0].can_send());
        assert_eq!(codes_of(1), vec![codes::NOT_EXTERNAL, codes::SEND_ZERO]);
        assert!(!rows[1].can_send());
        assert_eq!(codes_of(2), vec![codes::NOT_EXTERNAL, codes::SEND_ZERO]);

        let unmatched: Vec<&str> = session.external().unmatched().map(|r| r.ident.as_str()).collect();
        assert_eq!(unmatched, vec!["u3"]);
    }

    #[tokio::test]
    async fn test_group_loads_member_grades_only() {
        let fx = fixture();
        let mut session = session(&fx, ctx().with_group(Some(GroupId::new(5).unwrap()))).await;
        session.populate().await.unwrap();

        assert_eq!(session.students().len(), 1);
        let grades = session.load_local_grades(None).await.unwrap();
        assert_eq!(grades.len(), 1);
        assert!(grades.contains_key(&uid(11)));
    }

    #[tokio::test]
    async fn test_explicit_ids_supersede_group() {
        let fx = fixture();
        let session = session(&fx, ctx().with_group(Some(GroupId::new(5).unwrap()))).await;

        let grades = session.load_local_grades(Some(&[uid(10)])).await.unwrap();
        assert_eq!(grades.len(), 1);
        assert_eq!(grades[&uid(10)].final_grade, Some(70.0));

        assert!(session.load_local_grades(Some(&[])).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permissions() {
        let fx = fixture();
        let session = session(&fx, ctx()).await;
        assert!(session.can_view_grades().await.unwrap());

        // grade:export without gradeexport:publish
        let notifications = session.can_send_grades().await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].code, codes::CANNOT_SEND_GRADES);
    }

    #[tokio::test]
    async fn test_send_data_in_selection_order() {
        let fx = fixture();
        let session = session(&fx, ctx()).await;

        let selected = vec![
            (uid(11), ExternalId::new("u2").unwrap()),
            (uid(10), ExternalId::new("u1").unwrap()),
        ];
        let outcome = session.send_data(&selected, &SubmittedFields::new()).await.unwrap();

        assert!(!outcome.has_errors());
        let sent = fx.log.entries().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].ident.as_str(), "u2");
        assert_eq!(sent[0].grade, None);
        assert_eq!(sent[1].grade, Some(70.0));
        assert!(sent[0].fields.is_empty());
    }

    #[tokio::test]
    async fn test_send_data_cleans_identifiers() {
        let fx = fixture();
        let session = session(&fx, ctx()).await;

        let selected = vec![
            (uid(10), ExternalId::new(" u-1 ").unwrap()),
            (uid(11), ExternalId::new("--").unwrap()),
        ];
        let outcome = session.send_data(&selected, &SubmittedFields::new()).await.unwrap();

        assert_eq!(outcome.success_count(), 1);
        let sent = fx.log.entries().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].ident.as_str(), "u1");
        assert_eq!(sent[0].grade, Some(70.0));
    }

    #[tokio::test]
    async fn test_run_undeclared_action() {
        let fx = fixture();
        let session = session(&fx, ctx()).await;
        let err = session.run_action("delete_everything").await.unwrap_err();
        assert!(matches!(err, GradeExportError::UnknownAction(_)));
    }

    #[tokio::test]
    async fn test_missing_grade_item() {
        let fx = fixture();
        let mut context = ctx();
        context.course.id = CourseId::new(99).unwrap();
        let err = ExportSession::new(context, fx.driver.clone(), fx.host.clone())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, GradeExportError::NotFound(_)));
    }
}
