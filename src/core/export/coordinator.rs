//! Export coordinator - handles one export request from start to finish
//!
//! Resolves the course and group, selects a driver, checks permissions,
//! submits selected grades and composes the [`ExportPage`] shown to the user.

use super::session::{ExportSession, SubmittedFields};
use super::summary::SubmissionOutcome;
use crate::adapters::drivers::{ActionOutput, DriverRegistry};
use crate::adapters::host::{capabilities, HostPlatform, InMemoryHost};
use crate::config::AppConfig;
use crate::core::report::{CourseSelector, ExportPage, GroupSelector, ReportBuilder, SelectOption};
use crate::domain::ids::{CourseId, ExternalId, GroupId, UserId};
use crate::domain::message::permits_sending;
use crate::domain::strings::{self, codes};
use crate::domain::{
    Course, GradeExportError, Group, Notification, RequestContext, Result, StudentOrder,
};
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;

/// Form key pattern of per-student values: `send[10]`, `attendance[10]`
const INDEXED_KEY_PATTERN: &str = r"^([A-Za-z_][A-Za-z0-9_]*)\[(\d+)\]$";

/// Grades selected for sending, as posted by the report form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    /// `send[userid]=ident` pairs in form order
    pub selected: Vec<(UserId, ExternalId)>,

    /// Editable field values, `{field}[userid]=value`
    pub field_values: SubmittedFields,
}

impl Submission {
    /// Collect the per-student values of a posted form
    ///
    /// Keys that are not indexed by a user id are ignored, as are empty
    /// identifiers. A repeated `send[userid]` keeps its first position and its
    /// last value.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero user id.
    pub fn from_form(pairs: &[(String, String)]) -> Result<Self> {
        let pattern = Regex::new(INDEXED_KEY_PATTERN)
            .map_err(|e| GradeExportError::Configuration(format!("Invalid form pattern: {e}")))?;

        let mut submission = Submission::default();
        for (key, value) in pairs {
            let Some(captures) = pattern.captures(key) else {
                continue;
            };
            let name = &captures[1];
            let user: UserId = captures[2].parse().map_err(GradeExportError::Validation)?;

            if name == "send" {
                let Ok(ident) = ExternalId::new(value.as_str()) else {
                    continue;
                };
                match submission.selected.iter_mut().find(|(u, _)| *u == user) {
                    Some(entry) => entry.1 = ident,
                    None => submission.selected.push((user, ident)),
                }
            } else {
                submission
                    .field_values
                    .entry(name.to_string())
                    .or_default()
                    .insert(user, value.clone());
            }
        }
        Ok(submission)
    }
}

/// One export request
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub course_id: CourseId,
    pub affiliated_course_id: Option<CourseId>,
    pub group_id: Option<GroupId>,
    pub order_by: StudentOrder,
    pub active_only: bool,
    pub action: Option<String>,
    pub submission: Option<Submission>,
}

impl ExportRequest {
    pub fn new(course_id: CourseId) -> Self {
        Self {
            course_id,
            affiliated_course_id: None,
            group_id: None,
            order_by: StudentOrder::Default,
            active_only: false,
            action: None,
            submission: None,
        }
    }

    pub fn with_affiliated_course(mut self, course: Option<CourseId>) -> Self {
        self.affiliated_course_id = course;
        self
    }

    pub fn with_group(mut self, group: Option<GroupId>) -> Self {
        self.group_id = group;
        self
    }

    pub fn with_order(mut self, order: StudentOrder) -> Self {
        self.order_by = order;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_submission(mut self, submission: Submission) -> Self {
        self.submission = Some(submission);
        self
    }

    /// Build a request from query and form parameters
    ///
    /// Recognised keys: `affiliatedcourseid`, `groupid`, `orderby`,
    /// `activeonly`, `action` and, when `sendgrades` is present, the
    /// submission. A zero or empty course/group id means none.
    ///
    /// # Errors
    ///
    /// Returns a validation error for ids that are not numbers.
    pub fn from_params(course_id: CourseId, pairs: &[(String, String)]) -> Result<Self> {
        let mut request = ExportRequest::new(course_id);

        for (key, value) in pairs {
            match key.as_str() {
                "affiliatedcourseid" => {
                    request.affiliated_course_id = optional_id(value)?
                        .map(CourseId::new)
                        .transpose()
                        .map_err(GradeExportError::Validation)?;
                }
                "groupid" => {
                    request.group_id = optional_id(value)?
                        .map(GroupId::new)
                        .transpose()
                        .map_err(GradeExportError::Validation)?;
                }
                "orderby" => request.order_by = StudentOrder::from_param(value),
                "activeonly" => request.active_only = matches!(value.as_str(), "1" | "true"),
                "action" if !value.trim().is_empty() => {
                    request.action = Some(value.trim().to_string());
                }
                _ => {}
            }
        }

        if pairs.iter().any(|(key, _)| key == "sendgrades") {
            request.submission = Some(Submission::from_form(pairs)?);
        }

        Ok(request)
    }
}

fn optional_id(value: &str) -> Result<Option<u64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let id = value
        .parse::<u64>()
        .map_err(|_| GradeExportError::Validation(format!("Invalid id: '{value}'")))?;
    Ok((id != 0).then_some(id))
}

/// What a request produced
#[derive(Debug)]
pub enum ExportResponse {
    /// The export page
    Page(ExportPage),
    /// Output of a driver action, such as a file download
    Action(ActionOutput),
}

/// Export coordinator
pub struct ExportCoordinator {
    registry: Arc<DriverRegistry>,
    host: Arc<dyn HostPlatform>,
    enabled: Vec<String>,
}

impl ExportCoordinator {
    pub fn new(
        registry: Arc<DriverRegistry>,
        host: Arc<dyn HostPlatform>,
        enabled: Vec<String>,
    ) -> Self {
        Self {
            registry,
            host,
            enabled,
        }
    }

    /// Build a coordinator from configuration: built-in drivers and the
    /// host snapshot named in `[host]`
    ///
    /// # Errors
    ///
    /// Fails when the snapshot cannot be loaded or a driver cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = DriverRegistry::with_defaults(config)?;
        let host = InMemoryHost::load(&config.host.snapshot_path)?;
        Ok(Self::new(
            Arc::new(registry),
            Arc::new(host),
            config.drivers.enabled.clone(),
        ))
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    pub fn enabled_drivers(&self) -> &[String] {
        &self.enabled
    }

    /// Handle one request on behalf of `user`
    ///
    /// Permission and course problems end up as notifications on the page.
    ///
    /// # Errors
    ///
    /// Unknown or unlinked courses, undeclared actions, driver configuration
    /// mistakes and a submission the user may not make are fatal.
    pub async fn handle(&self, user: UserId, request: ExportRequest) -> Result<ExportResponse> {
        let started = Instant::now();
        let course = self.host.fetch_course(request.course_id).await?;
        let mut page = ExportPage::new(strings::TITLE_HEADER, course.id.get());

        tracing::info!(
            course_id = %course.id,
            user_id = %user,
            action = request.action.as_deref().unwrap_or(""),
            submission = request.submission.is_some(),
            "Handling export request"
        );

        let affiliated = self.host.affiliated_courses(course.id).await?;
        let selected_id = request.affiliated_course_id.filter(|id| *id != course.id);
        let (target, parent) = match selected_id {
            None => (course.clone(), None),
            Some(id) => match affiliated.iter().find(|c| c.id == id) {
                Some(child) => (child.clone(), Some(course.clone())),
                None => {
                    return Err(GradeExportError::Validation(format!(
                        "Course {id} is not affiliated to course {}",
                        course.id
                    )))
                }
            },
        };

        if let Some(id) = selected_id {
            page.query.set("affiliatedcourseid", id.to_string());
        }
        if let Some(order) = request.order_by.as_param() {
            page.query.set("orderby", order);
        }

        if !affiliated.is_empty() {
            page.notify(Notification::message(codes::VISIT_GROUPED_COURSES));
            page.course_selector = Some(course_selector(&affiliated, selected_id));
            if selected_id.is_none() {
                return Ok(ExportResponse::Page(page));
            }
        }

        let ctx = RequestContext::new(target, user)
            .with_parent(parent)
            .with_group(request.group_id)
            .with_order(request.order_by)
            .with_active_only(request.active_only);

        let Some(driver) = self.registry.select(&self.enabled, &ctx)? else {
            page.notify(Notification::problem(codes::CANNOT_EXPORT));
            return Ok(ExportResponse::Page(page));
        };
        page.title = driver.title_header();

        let session = ExportSession::new(ctx, driver, self.host.clone()).await?;
        if !session.can_view_grades().await? {
            page.notify(Notification::problem(codes::CANNOT_VIEW_GRADES));
            return Ok(ExportResponse::Page(page));
        }

        if !self.host.parent_courses(course.id).await?.is_empty() {
            page.notify(Notification::message(codes::GROUPED_COURSE));
        }

        let group = match self.resolve_group(session.context(), &mut page).await? {
            GroupAccess::Granted(group) => group,
            GroupAccess::Denied if request.action.is_some() => {
                return Err(GradeExportError::Permission(format!(
                    "User {user} cannot access the groups of course {}",
                    session.context().course.id
                )));
            }
            GroupAccess::Denied => {
                page.notify(Notification::problem(codes::CANNOT_ACCESS_GROUPS));
                return Ok(ExportResponse::Page(page));
            }
        };
        page.query
            .set("groupid", group.map(|g| g.get()).unwrap_or(0).to_string());
        let mut session = session.with_group(group);

        if let Some(action) = &request.action {
            if !session.driver().actions().contains(action) {
                return Err(GradeExportError::UnknownAction(action.clone()));
            }
            session.populate().await?;
            let output = session.run_action(action).await?;
            return Ok(ExportResponse::Action(output));
        }

        let course_notifications = session.can_send_grades().await?;
        let can_send = permits_sending(&course_notifications);
        page.notifications.extend(course_notifications);

        let mut outcome: Option<SubmissionOutcome> = None;
        if let Some(submission) = &request.submission {
            if !can_send {
                return Err(GradeExportError::Permission(format!(
                    "User {user} cannot send grades of course {}",
                    session.context().course.id
                )));
            }
            if submission.selected.is_empty() {
                page.notify(Notification::problem(codes::NO_SELECTED_STUDENTS));
            } else {
                let sent = session
                    .send_data(&submission.selected, &submission.field_values)
                    .await?;
                page.notify(sent.notification());
                outcome = Some(sent);
            }
        }

        session.populate().await?;
        let report = ReportBuilder::new(&mut session, can_send)
            .with_submission(outcome.as_ref())
            .build();

        tracing::info!(
            course_id = %session.context().course.id,
            driver = session.driver().id(),
            rows = report.rows.len(),
            can_send,
            duration_ms = started.elapsed().as_millis() as u64,
            "Export page ready"
        );

        page.report = Some(report);
        Ok(ExportResponse::Page(page))
    }

    /// Decide which group the user sees and fill the group selector
    async fn resolve_group(
        &self,
        ctx: &RequestContext,
        page: &mut ExportPage,
    ) -> Result<GroupAccess> {
        let course = ctx.course.id;
        let access_all = self
            .host
            .has_capability(capabilities::ACCESS_ALL_GROUPS, course, ctx.user)
            .await?;

        if access_all {
            let groups = self.host.course_groups(course).await?;
            if groups.is_empty() {
                return Ok(GroupAccess::Granted(None));
            }
            let group = match ctx.group {
                Some(id) if !groups.iter().any(|g| g.id == id) => {
                    return Err(GradeExportError::NotFound(format!(
                        "Group {id} in course {course}"
                    )))
                }
                other => other,
            };

            let mut options = vec![SelectOption::new(0, strings::ALL_PARTICIPANTS)];
            options.extend(group_options(&groups));
            page.group_selector = Some(GroupSelector {
                options,
                selected: group.map(|g| g.get()).unwrap_or(0),
            });
            return Ok(GroupAccess::Granted(group));
        }

        let mine = self.host.user_groups(course, ctx.user).await?;
        let group = match (ctx.group, mine.first()) {
            (Some(id), _) if mine.iter().any(|g| g.id == id) => id,
            (Some(id), _) => {
                tracing::warn!(group_id = %id, user_id = %ctx.user, "Group not accessible to user");
                return Ok(GroupAccess::Denied);
            }
            (None, Some(first)) => first.id,
            (None, None) => {
                if self.host.course_groups(course).await?.is_empty() {
                    return Ok(GroupAccess::Granted(None));
                }
                return Ok(GroupAccess::Denied);
            }
        };

        page.group_selector = Some(GroupSelector {
            options: group_options(&mine).collect(),
            selected: group.get(),
        });
        Ok(GroupAccess::Granted(Some(group)))
    }
}

enum GroupAccess {
    Granted(Option<GroupId>),
    Denied,
}

fn group_options(groups: &[Group]) -> impl Iterator<Item = SelectOption> + '_ {
    groups
        .iter()
        .map(|g| SelectOption::new(g.id.get(), g.name.clone()))
}

fn course_selector(courses: &[Course], selected: Option<CourseId>) -> CourseSelector {
    CourseSelector {
        options: courses
            .iter()
            .map(|c| SelectOption::new(c.id.get(), c.fullname.clone()))
            .collect(),
        selected: selected.map(|id| id.get()),
    }
}
