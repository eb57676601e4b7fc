//! In-memory host platform
//!
//! [`InMemoryHost`] serves every host interface from a [`HostSnapshot`], a
//! JSON document holding courses, users, enrolments, groups, grades and
//! capability grants. The CLI and the HTTP server load it from the
//! `[host] snapshot_path` file; tests build snapshots directly.

use super::traits::{
    AttendanceSource, CourseDirectory, EnrollmentService, GradeStore, PermissionService,
};
use crate::domain::context::ResultExt;
use crate::domain::ids::{CourseId, GroupId, UserId};
use crate::domain::{Course, GradeExportError, GradeItem, Group, HostUser, LocalGrade, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Meta link: the students of `child` are pulled into `parent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaLink {
    pub parent: CourseId,
    pub child: CourseId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrolment {
    pub course: CourseId,
    pub user: UserId,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub course_id: CourseId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub item_id: u64,
    pub user_id: UserId,
    #[serde(default)]
    pub final_grade: Option<f64>,
}

/// Capabilities granted to a user, in one course or site-wide when `course` is absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub user: UserId,
    #[serde(default)]
    pub course: Option<CourseId>,
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub course: CourseId,
    pub user: UserId,
    /// Attended fraction of sessions, `0.0..=1.0`
    pub rate: f64,
}

/// Serializable contents of an [`InMemoryHost`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSnapshot {
    pub courses: Vec<Course>,
    pub meta_links: Vec<MetaLink>,
    pub users: Vec<HostUser>,
    pub enrolments: Vec<Enrolment>,
    pub groups: Vec<GroupRecord>,
    pub grade_items: Vec<GradeItem>,
    pub grades: Vec<GradeRecord>,
    pub grants: Vec<Grant>,
    pub attendance: Vec<AttendanceRecord>,
}

impl HostSnapshot {
    /// Parse a snapshot from JSON text
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the JSON does not match the snapshot layout.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Host platform backed by an in-memory snapshot
#[derive(Debug, Clone)]
pub struct InMemoryHost {
    snapshot: HostSnapshot,
    users: HashMap<UserId, HostUser>,
}

impl InMemoryHost {
    pub fn new(snapshot: HostSnapshot) -> Self {
        let users = snapshot
            .users
            .iter()
            .map(|user| (user.id, user.clone()))
            .collect();
        Self { snapshot, users }
    }

    /// Load a snapshot file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read host snapshot {}", path.display()))?;
        let snapshot = HostSnapshot::from_json(&json)
            .with_context(|| format!("Invalid host snapshot {}", path.display()))?;

        tracing::debug!(
            path = %path.display(),
            courses = snapshot.courses.len(),
            users = snapshot.users.len(),
            "Loaded host snapshot"
        );

        Ok(Self::new(snapshot))
    }

    pub fn snapshot(&self) -> &HostSnapshot {
        &self.snapshot
    }

    fn course(&self, id: CourseId) -> Option<&Course> {
        self.snapshot.courses.iter().find(|c| c.id == id)
    }

    fn group(&self, id: GroupId) -> Option<&GroupRecord> {
        self.snapshot.groups.iter().find(|g| g.id == id)
    }

    fn courses_where<F>(&self, pick: F) -> Vec<Course>
    where
        F: Fn(&MetaLink) -> Option<CourseId>,
    {
        self.snapshot
            .meta_links
            .iter()
            .filter_map(pick)
            .filter_map(|id| self.course(id).cloned())
            .collect()
    }
}

fn to_group(record: &GroupRecord) -> Group {
    Group {
        id: record.id,
        course_id: record.course_id,
        name: record.name.clone(),
    }
}

#[async_trait]
impl EnrollmentService for InMemoryHost {
    async fn fetch_enrolled(
        &self,
        course: CourseId,
        group: Option<GroupId>,
        active_only: bool,
    ) -> Result<Vec<HostUser>> {
        if self.course(course).is_none() {
            return Err(GradeExportError::NotFound(format!("course {course}")));
        }

        let members = match group {
            Some(id) => Some(
                self.group(id)
                    .ok_or_else(|| GradeExportError::NotFound(format!("group {id}")))?
                    .members
                    .clone(),
            ),
            None => None,
        };

        let mut enrolled: Vec<HostUser> = self
            .snapshot
            .enrolments
            .iter()
            .filter(|e| e.course == course && (e.active || !active_only))
            .filter(|e| members.as_ref().map_or(true, |m| m.contains(&e.user)))
            .filter_map(|e| self.users.get(&e.user).cloned())
            .collect();
        enrolled.sort_by_key(|u| u.id);
        enrolled.dedup_by_key(|u| u.id);

        Ok(enrolled)
    }
}

#[async_trait]
impl GradeStore for InMemoryHost {
    async fn fetch_course_grade_item(&self, course: CourseId) -> Result<GradeItem> {
        self.snapshot
            .grade_items
            .iter()
            .find(|item| item.course_id == course)
            .cloned()
            .ok_or_else(|| GradeExportError::NotFound(format!("grade item of course {course}")))
    }

    async fn fetch_grades(
        &self,
        item: &GradeItem,
        user_ids: Option<&[UserId]>,
    ) -> Result<HashMap<UserId, LocalGrade>> {
        Ok(self
            .snapshot
            .grades
            .iter()
            .filter(|g| g.item_id == item.id)
            .filter(|g| user_ids.map_or(true, |ids| ids.contains(&g.user_id)))
            .map(|g| (g.user_id, LocalGrade::new(g.user_id, g.final_grade)))
            .collect())
    }
}

#[async_trait]
impl PermissionService for InMemoryHost {
    async fn has_capability(
        &self,
        capability: &str,
        course: CourseId,
        user: UserId,
    ) -> Result<bool> {
        Ok(self.snapshot.grants.iter().any(|grant| {
            grant.user == user
                && grant.course.map_or(true, |c| c == course)
                && grant.capabilities.iter().any(|c| c == capability)
        }))
    }
}

#[async_trait]
impl CourseDirectory for InMemoryHost {
    async fn fetch_course(&self, course: CourseId) -> Result<Course> {
        self.course(course)
            .cloned()
            .ok_or_else(|| GradeExportError::NotFound(format!("course {course}")))
    }

    async fn affiliated_courses(&self, course: CourseId) -> Result<Vec<Course>> {
        Ok(self.courses_where(|link| (link.parent == course).then_some(link.child)))
    }

    async fn parent_courses(&self, course: CourseId) -> Result<Vec<Course>> {
        Ok(self.courses_where(|link| (link.child == course).then_some(link.parent)))
    }

    async fn course_groups(&self, course: CourseId) -> Result<Vec<Group>> {
        Ok(self
            .snapshot
            .groups
            .iter()
            .filter(|g| g.course_id == course)
            .map(to_group)
            .collect())
    }

    async fn user_groups(&self, course: CourseId, user: UserId) -> Result<Vec<Group>> {
        Ok(self
            .snapshot
            .groups
            .iter()
            .filter(|g| g.course_id == course && g.members.contains(&user))
            .map(to_group)
            .collect())
    }
}

#[async_trait]
impl AttendanceSource for InMemoryHost {
    async fn fetch_attendance(&self, course: CourseId) -> Result<HashMap<UserId, f64>> {
        Ok(self
            .snapshot
            .attendance
            .iter()
            .filter(|a| a.course == course)
            .map(|a| (a.user, a.rate))
            .collect())
    }
}
