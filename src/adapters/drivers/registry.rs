//! Driver registry
//!
//! Maps driver identifiers to factories. Drivers are registered explicitly at
//! startup; [`DriverRegistry::select`] walks the configured identifiers in
//! order and returns the first driver that handles the request's course.

use super::http::HttpDriverFactory;
use super::sample::{SampleDriverFactory, SubmissionLog};
use super::{validate_driver, DriverFactory, ExportDriver};
use crate::config::AppConfig;
use crate::domain::{RequestContext, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry of export driver factories
#[derive(Default)]
pub struct DriverRegistry {
    factories: BTreeMap<&'static str, Arc<dyn DriverFactory>>,
}

impl DriverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `sample` and `http` drivers
    ///
    /// The `http` factory fails on `create` when the `[http]` section is
    /// missing, so it only matters once the driver is enabled.
    pub fn with_defaults(config: &AppConfig) -> Result<Self> {
        Self::with_submission_log(config, SubmissionLog::new())
    }

    /// Same as [`with_defaults`](Self::with_defaults) with a caller-owned sample log
    pub fn with_submission_log(config: &AppConfig, log: SubmissionLog) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(SampleDriverFactory::new(
            config.sample.clone(),
            log,
        )));
        registry.register(Arc::new(HttpDriverFactory::new(config.http.clone())));
        Ok(registry)
    }

    /// Register a factory, replacing any factory with the same identifier
    pub fn register(&mut self, factory: Arc<dyn DriverFactory>) {
        if self.factories.insert(factory.id(), factory.clone()).is_some() {
            tracing::debug!(driver = factory.id(), "Replaced driver factory");
        }
    }

    /// Registered identifiers, sorted
    pub fn ids(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Instantiate and validate one driver by identifier
    ///
    /// Returns `Ok(None)` for an unregistered identifier.
    pub fn create(&self, id: &str) -> Result<Option<Arc<dyn ExportDriver>>> {
        let Some(factory) = self.factories.get(id) else {
            return Ok(None);
        };
        let driver = factory.create()?;
        validate_driver(driver.as_ref())?;
        Ok(Some(driver))
    }

    /// Pick the driver for a request
    ///
    /// Walks `enabled` in order, skipping unknown identifiers with a warning.
    /// Returns the first driver whose `knows_how_to_send_grades` accepts the
    /// context, or `None`.
    ///
    /// # Errors
    ///
    /// A driver that cannot be built or whose field mapping is invalid is a
    /// configuration error; selection stops there.
    pub fn select(
        &self,
        enabled: &[String],
        ctx: &RequestContext,
    ) -> Result<Option<Arc<dyn ExportDriver>>> {
        for id in enabled {
            let Some(driver) = self.create(id)? else {
                tracing::warn!(driver = %id, "Unknown export driver in configuration, skipping");
                continue;
            };

            if driver.knows_how_to_send_grades(ctx) {
                tracing::debug!(driver = %id, course_id = %ctx.course.id, "Export driver selected");
                return Ok(Some(driver));
            }
        }

        tracing::debug!(course_id = %ctx.course.id, "No export driver handles this course");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::field::{FieldSource, FULL_NAME, GRADE, USER_IDENT};
    use crate::domain::ids::{CourseId, ExternalId, UserId};
    use crate::domain::{
        Course, EnrolledStudent, ExternalRecords, FieldMapping, FieldSpec, FieldValue,
        GradeExportError, LocalGrade, ReconciliationMessage, ValueType,
    };
    use async_trait::async_trait;
    use std::collections::BTreeMap as Map;

    struct StubDriver {
        id: &'static str,
        knows: bool,
        mapping: FieldMapping,
    }

    fn full_mapping() -> FieldMapping {
        FieldMapping::new()
            .with_field(USER_IDENT, FieldSpec::new("Id", ValueType::AlphaNum))
            .with_field(FULL_NAME, FieldSpec::new("Name", ValueType::Text))
            .with_field(GRADE, FieldSpec::new("Grade", ValueType::Float))
    }

    #[async_trait]
    impl ExportDriver for StubDriver {
        fn id(&self) -> &str {
            self.id
        }

        fn field_mapping(&self) -> FieldMapping {
            self.mapping.clone()
        }

        fn knows_how_to_send_grades(&self, _ctx: &RequestContext) -> bool {
            self.knows
        }

        async fn load_external_data(
            &self,
            _ctx: &RequestContext,
            _students: &[EnrolledStudent],
        ) -> Result<ExternalRecords> {
            Ok(ExternalRecords::new())
        }

        async fn send_user_data(
            &self,
            _ctx: &RequestContext,
            _user: UserId,
            _ident: &ExternalId,
            _grade: &LocalGrade,
            _fields: &Map<String, FieldValue>,
        ) -> Result<Vec<ReconciliationMessage>> {
            Ok(Vec::new())
        }
    }

    struct StubFactory {
        id: &'static str,
        knows: bool,
        mapping: FieldMapping,
    }

    impl StubFactory {
        fn new(id: &'static str, knows: bool) -> Arc<Self> {
            Arc::new(Self {
                id,
                knows,
                mapping: full_mapping(),
            })
        }
    }

    impl DriverFactory for StubFactory {
        fn id(&self) -> &'static str {
            self.id
        }

        fn create(&self) -> Result<Arc<dyn ExportDriver>> {
            Ok(Arc::new(StubDriver {
                id: self.id,
                knows: self.knows,
                mapping: self.mapping.clone(),
            }))
        }
    }

    fn ctx() -> RequestContext {
        let course = Course {
            id: CourseId::new(2).unwrap(),
            shortname: "MAT101".to_string(),
            fullname: "Calculus I".to_string(),
            idnumber: String::new(),
        };
        RequestContext::new(course, UserId::new(7).unwrap())
    }

    fn enabled(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn registry() -> DriverRegistry {
        let mut registry = DriverRegistry::new();
        registry.register(StubFactory::new("a", false));
        registry.register(StubFactory::new("b", true));
        registry.register(StubFactory::new("c", true));
        registry
    }

    #[test]
    fn test_select_first_driver_that_knows() {
        let driver = registry()
            .select(&enabled(&["a", "b", "c"]), &ctx())
            .unwrap()
            .unwrap();
        assert_eq!(driver.id(), "b");
    }

    #[test]
    fn test_select_respects_configured_order() {
        let driver = registry()
            .select(&enabled(&["c", "b"]), &ctx())
            .unwrap()
            .unwrap();
        assert_eq!(driver.id(), "c");
    }

    #[test]
    fn test_select_none_when_nobody_knows() {
        assert!(registry().select(&enabled(&["a"]), &ctx()).unwrap().is_none());
        assert!(registry().select(&[], &ctx()).unwrap().is_none());
    }

    #[test]
    fn test_select_skips_unknown_ids() {
        let driver = registry()
            .select(&enabled(&["missing", "a", "c"]), &ctx())
            .unwrap()
            .unwrap();
        assert_eq!(driver.id(), "c");
    }

    #[test]
    fn test_invalid_mapping_is_fatal() {
        let mut registry = registry();
        registry.register(Arc::new(StubFactory {
            id: "broken",
            knows: true,
            mapping: FieldMapping::new()
                .with_field(USER_IDENT, FieldSpec::new("Id", ValueType::AlphaNum))
                .with_field(GRADE, FieldSpec::new("Grade", ValueType::Float)),
        }));

        let err = registry
            .select(&enabled(&["broken", "b"]), &ctx())
            .err()
            .unwrap();
        assert!(matches!(err, GradeExportError::MandatoryField(ref f) if f == FULL_NAME));
    }

    #[test]
    fn test_driver_field_without_handler_is_fatal() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(StubFactory {
            id: "nohandler",
            knows: true,
            mapping: full_mapping().with_field(
                "attendance",
                FieldSpec::new("Attendance", ValueType::Float).source(FieldSource::Driver),
            ),
        }));

        let err = registry
            .select(&enabled(&["nohandler"]), &ctx())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            GradeExportError::MissingFieldHandler { ref field, .. } if field == "attendance"
        ));
    }

    #[test]
    fn test_with_defaults_registers_builtin_drivers() {
        let registry = DriverRegistry::with_defaults(&AppConfig::default()).unwrap();
        assert_eq!(registry.ids(), vec!["http", "sample"]);

        let driver = registry.select(&enabled(&["sample"]), &ctx()).unwrap().unwrap();
        assert_eq!(driver.id(), "sample");

        let err = registry.select(&enabled(&["http"]), &ctx()).err().unwrap();
        assert!(err.is_configuration());
    }
}
