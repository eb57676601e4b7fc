//! Field mapping: the declarative description of report and export columns
//!
//! A driver declares a [`FieldMapping`] once. Before use it is merged with the
//! default descriptor `{editable: false, align: left, default: empty, source: system}`
//! into a [`MergedFieldMapping`]; only the keys the driver set explicitly
//! override the defaults. The fields `userident`, `fullname` and `grade` are
//! mandatory.
//!
//! # Example
//!
//! ```
//! use gradeexport::domain::field::{Alignment, FieldMapping, FieldSource, FieldSpec, FieldValue, ValueType};
//!
//! let mapping = FieldMapping::new()
//!     .with_field("userident", FieldSpec::new("Registration", ValueType::AlphaNum))
//!     .with_field("fullname", FieldSpec::new("Name", ValueType::Text))
//!     .with_field(
//!         "attendance",
//!         FieldSpec::new("Attendance", ValueType::Float)
//!             .source(FieldSource::Driver)
//!             .align(Alignment::Right)
//!             .default_value(FieldValue::Float(0.0)),
//!     )
//!     .with_field("grade", FieldSpec::new("Current grade", ValueType::Float).align(Alignment::Right));
//!
//! let merged = mapping.merge().unwrap();
//! assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["userident", "fullname", "attendance", "grade"]);
//! assert!(!merged.get("fullname").unwrap().editable);
//! ```

use super::errors::GradeExportError;
use super::result::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field name of the student's external identifier
pub const USER_IDENT: &str = "userident";
/// Field name of the student's display name
pub const FULL_NAME: &str = "fullname";
/// Field name of the course final grade
pub const GRADE: &str = "grade";

/// Fields every driver must declare
pub const MANDATORY_FIELDS: [&str; 3] = [USER_IDENT, FULL_NAME, GRADE];

/// Value type of a field; drives how submitted form text is cleaned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    AlphaNum,
    Text,
    Int,
    Float,
    Bool,
}

impl ValueType {
    /// Cleans raw submitted text into a typed value
    ///
    /// Cleaning never fails: numbers that do not parse fall back to `default`.
    pub fn clean(&self, raw: &str, default: &FieldValue) -> FieldValue {
        let raw = raw.trim();
        match self {
            ValueType::AlphaNum => {
                let cleaned: String = raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
                if cleaned.is_empty() {
                    default.clone()
                } else {
                    FieldValue::Text(cleaned)
                }
            }
            ValueType::Text => {
                if raw.is_empty() {
                    default.clone()
                } else {
                    FieldValue::Text(raw.to_string())
                }
            }
            ValueType::Int => raw
                .parse::<i64>()
                .map(FieldValue::Int)
                .unwrap_or_else(|_| default.clone()),
            ValueType::Float => raw
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(FieldValue::Float)
                .unwrap_or_else(|| default.clone()),
            ValueType::Bool => FieldValue::Bool(matches!(
                raw.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            )),
        }
    }
}

/// A typed field value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value, when it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Bool(_) | FieldValue::Empty => None,
        }
    }

    /// Truthiness used for checkbox columns
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Empty => false,
            FieldValue::Bool(b) => *b,
            FieldValue::Int(v) => *v != 0,
            FieldValue::Float(v) => *v != 0.0,
            FieldValue::Text(s) => !s.is_empty() && s != "0",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", if *b { "1" } else { "0" }),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Empty,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map(FieldValue::Float).unwrap_or_default(),
            },
            serde_json::Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

/// Horizontal alignment hint for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

/// Where the values of a field come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
    /// Host platform data (identifier, name, grade)
    #[default]
    System,
    /// Loaded by a driver field handler
    Driver,
    /// Read from the external record
    External,
}

/// Field descriptor as declared by a driver
///
/// Unset options fall back to the defaults during [`FieldMapping::merge`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Column display name
    pub name: String,

    pub value_type: ValueType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<FieldSource>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            editable: None,
            align: None,
            default: None,
            source: None,
        }
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = Some(editable);
        self
    }

    pub fn align(mut self, align: Alignment) -> Self {
        self.align = Some(align);
        self
    }

    pub fn default_value(mut self, default: FieldValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn source(mut self, source: FieldSource) -> Self {
        self.source = Some(source);
        self
    }
}

/// Ordered mapping of field name to descriptor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMapping {
    fields: Vec<(String, FieldSpec)>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing an earlier declaration with the same key in place
    pub fn with_field(mut self, key: impl Into<String>, spec: FieldSpec) -> Self {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = spec,
            None => self.fields.push((key, spec)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, s)| (k.as_str(), s))
    }

    /// Merges every descriptor over the defaults
    ///
    /// # Errors
    ///
    /// Returns [`GradeExportError::MandatoryField`] naming the first missing
    /// mandatory field.
    pub fn merge(&self) -> Result<MergedFieldMapping> {
        for field in MANDATORY_FIELDS {
            if !self.contains(field) {
                return Err(GradeExportError::MandatoryField(field.to_string()));
            }
        }

        let fields = self
            .fields
            .iter()
            .map(|(key, spec)| MergedField {
                key: key.clone(),
                name: spec.name.clone(),
                value_type: spec.value_type,
                editable: spec.editable.unwrap_or(false),
                align: spec.align.unwrap_or_default(),
                default: spec.default.clone().unwrap_or_default(),
                source: spec.source.unwrap_or_default(),
            })
            .collect();

        Ok(MergedFieldMapping { fields })
    }
}

/// Field descriptor after merging with the defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedField {
    pub key: String,
    pub name: String,
    pub value_type: ValueType,
    pub editable: bool,
    pub align: Alignment,
    pub default: FieldValue,
    pub source: FieldSource,
}

impl MergedField {
    /// Cleans a submitted value, substituting the field default when absent
    pub fn clean(&self, raw: Option<&str>) -> FieldValue {
        match raw {
            Some(raw) => self.value_type.clean(raw, &self.default),
            None => self.default.clone(),
        }
    }
}

/// Immutable, merged field mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedFieldMapping {
    fields: Vec<MergedField>,
}

impl MergedFieldMapping {
    pub fn get(&self, key: &str) -> Option<&MergedField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MergedField> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    pub fn editable(&self) -> impl Iterator<Item = &MergedField> {
        self.fields.iter().filter(|f| f.editable)
    }

    pub fn driver_sourced(&self) -> impl Iterator<Item = &MergedField> {
        self.fields.iter().filter(|f| f.source == FieldSource::Driver)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_mapping() -> FieldMapping {
        FieldMapping::new()
            .with_field(USER_IDENT, FieldSpec::new("Registration", ValueType::AlphaNum))
            .with_field(FULL_NAME, FieldSpec::new("Name", ValueType::Text))
            .with_field(
                GRADE,
                FieldSpec::new("Current grade", ValueType::Float).align(Alignment::Right),
            )
    }

    #[test]
    fn test_merge_applies_defaults() {
        let merged = complete_mapping().merge().unwrap();
        let name = merged.get(FULL_NAME).unwrap();
        assert!(!name.editable);
        assert_eq!(name.align, Alignment::Left);
        assert_eq!(name.default, FieldValue::Empty);
        assert_eq!(name.source, FieldSource::System);
    }

    #[test]
    fn test_merge_keeps_explicit_values() {
        let merged = complete_mapping()
            .with_field(
                "approved",
                FieldSpec::new("Approved", ValueType::Bool)
                    .editable(true)
                    .source(FieldSource::External)
                    .default_value(FieldValue::Bool(false)),
            )
            .merge()
            .unwrap();

        assert_eq!(merged.get(GRADE).unwrap().align, Alignment::Right);
        let approved = merged.get("approved").unwrap();
        assert!(approved.editable);
        assert_eq!(approved.source, FieldSource::External);
        assert_eq!(approved.default, FieldValue::Bool(false));
        assert_eq!(merged.editable().count(), 1);
    }

    #[test]
    fn test_merge_missing_mandatory_field() {
        for missing in MANDATORY_FIELDS {
            let mut mapping = FieldMapping::new();
            for (key, spec) in complete_mapping().iter() {
                if key != missing {
                    mapping = mapping.with_field(key, spec.clone());
                }
            }
            match mapping.merge() {
                Err(GradeExportError::MandatoryField(field)) => assert_eq!(field, missing),
                other => panic!("expected mandatory field error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_with_field_replaces_in_place() {
        let mapping = complete_mapping().with_field(USER_IDENT, FieldSpec::new("Id", ValueType::Text));
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.iter().next().unwrap().1.name, "Id");
    }

    #[test]
    fn test_clean_values() {
        let zero = FieldValue::Float(0.0);
        assert_eq!(ValueType::Float.clean("7,5", &zero), FieldValue::Float(7.5));
        assert_eq!(ValueType::Float.clean("abc", &zero), zero);
        assert_eq!(ValueType::Int.clean(" 12 ", &FieldValue::Empty), FieldValue::Int(12));
        assert_eq!(
            ValueType::AlphaNum.clean("ab-12 c", &FieldValue::Empty),
            FieldValue::Text("ab12c".to_string())
        );
        assert_eq!(ValueType::Bool.clean("on", &FieldValue::Empty), FieldValue::Bool(true));
        assert_eq!(ValueType::Bool.clean("", &FieldValue::Empty), FieldValue::Bool(false));
    }

    #[test]
    fn test_merged_field_clean_missing_uses_default() {
        let field = MergedField {
            key: "attendance".to_string(),
            name: "Attendance".to_string(),
            value_type: ValueType::Float,
            editable: true,
            align: Alignment::Right,
            default: FieldValue::Float(0.0),
            source: FieldSource::Driver,
        };
        assert_eq!(field.clean(None), FieldValue::Float(0.0));
        assert_eq!(field.clean(Some("80")), FieldValue::Float(80.0));
    }

    #[test]
    fn test_field_value_from_json() {
        assert_eq!(FieldValue::from(serde_json::json!(3)), FieldValue::Int(3));
        assert_eq!(FieldValue::from(serde_json::json!(2.5)), FieldValue::Float(2.5));
        assert_eq!(FieldValue::from(serde_json::json!(null)), FieldValue::Empty);
        assert!(FieldValue::from(serde_json::json!(true)).is_truthy());
    }
}
