//! Students on both sides of the reconciliation
//!
//! [`EnrolledStudent`] is the local view built from host users;
//! [`ExternalRecord`] is what the external grading system knows about a
//! student. [`ExternalRecords`] keeps records in load order, keyed by external
//! identifier, and tracks which ones were matched by an enrolled student.

use super::course::StudentOrder;
use super::ids::{ExternalId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// User as stored by the host platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub idnumber: String,
    #[serde(default)]
    pub email: String,
    pub firstname: String,
    pub lastname: String,
}

impl HostUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname).trim().to_string()
    }
}

/// Host user field holding the external identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserIdentField {
    #[default]
    Username,
    IdNumber,
    Email,
}

impl UserIdentField {
    pub fn read<'a>(&self, user: &'a HostUser) -> &'a str {
        match self {
            UserIdentField::Username => &user.username,
            UserIdentField::IdNumber => &user.idnumber,
            UserIdentField::Email => &user.email,
        }
    }
}

/// Student enrolled in the course (or group) being exported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledStudent {
    pub user_id: UserId,

    /// Identifier in the external system; `None` when the host field is blank
    pub ident: Option<ExternalId>,

    pub firstname: String,
    pub lastname: String,
}

impl EnrolledStudent {
    /// Builds the local view of a host user, reading the identifier from `field`
    pub fn from_host_user(user: &HostUser, field: UserIdentField) -> Self {
        Self {
            user_id: user.id,
            ident: ExternalId::new(field.read(user)).ok(),
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname).trim().to_string()
    }

    pub fn ident_str(&self) -> &str {
        self.ident.as_ref().map(ExternalId::as_str).unwrap_or("")
    }
}

/// Sorts students in place according to the requested order
pub fn sort_students(students: &mut [EnrolledStudent], order: StudentOrder) {
    match order {
        StudentOrder::FullName => students.sort_by(|a, b| {
            (a.firstname.to_lowercase(), a.lastname.to_lowercase(), a.ident_str())
                .cmp(&(b.firstname.to_lowercase(), b.lastname.to_lowercase(), b.ident_str()))
        }),
        StudentOrder::UserIdent => students.sort_by(|a, b| a.ident_str().cmp(b.ident_str())),
        StudentOrder::Default => students.sort_by(|a, b| {
            (a.lastname.to_lowercase(), a.firstname.to_lowercase(), a.user_id)
                .cmp(&(b.lastname.to_lowercase(), b.firstname.to_lowercase(), b.user_id))
        }),
    }
}

/// A student as known by the external grading system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub ident: ExternalId,

    pub fullname: String,

    /// Grade currently stored in the external system
    #[serde(default)]
    pub grade: Option<f64>,

    /// Additional fields addressed by the field mapping (source = external)
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ExternalRecord {
    pub fn new(ident: ExternalId, fullname: impl Into<String>, grade: Option<f64>) -> Self {
        Self {
            ident,
            fullname: fullname.into(),
            grade,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }
}

/// External records in load order, keyed by external identifier
#[derive(Debug, Clone, Default)]
pub struct ExternalRecords {
    records: Vec<ExternalRecord>,
    matched: Vec<bool>,
    index: HashMap<ExternalId, usize>,
}

impl ExternalRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record; a record with the same identifier replaces the earlier one
    pub fn insert(&mut self, record: ExternalRecord) {
        match self.index.get(&record.ident) {
            Some(&pos) => self.records[pos] = record,
            None => {
                self.index.insert(record.ident.clone(), self.records.len());
                self.records.push(record);
                self.matched.push(false);
            }
        }
    }

    pub fn get(&self, ident: &ExternalId) -> Option<&ExternalRecord> {
        self.index.get(ident).map(|&pos| &self.records[pos])
    }

    /// Looks a record up and flags it as matched by an enrolled student
    pub fn mark_matched(&mut self, ident: &ExternalId) -> Option<&ExternalRecord> {
        let pos = *self.index.get(ident)?;
        self.matched[pos] = true;
        Some(&self.records[pos])
    }

    pub fn is_matched(&self, ident: &ExternalId) -> bool {
        self.index
            .get(ident)
            .map(|&pos| self.matched[pos])
            .unwrap_or(false)
    }

    /// Records no enrolled student matched, in load order
    pub fn unmatched(&self) -> impl Iterator<Item = &ExternalRecord> {
        self.records
            .iter()
            .zip(self.matched.iter())
            .filter(|(_, matched)| !**matched)
            .map(|(record, _)| record)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExternalRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<ExternalRecord> for ExternalRecords {
    fn from_iter<I: IntoIterator<Item = ExternalRecord>>(iter: I) -> Self {
        let mut records = ExternalRecords::new();
        for record in iter {
            records.insert(record);
        }
        records
    }
}
