//! Domain identifier types with validation
//!
//! Newtype wrappers for host platform identifiers (courses, users, groups) and
//! for the identifier a student carries in the external grading system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            #[doc = concat!("Creates a new ", $label, " id; zero is reserved for \"none\"")]
            pub fn new(id: u64) -> Result<Self, String> {
                if id == 0 {
                    return Err(format!("{} id cannot be zero", $label));
                }
                Ok(Self(id))
            }

            /// Returns the numeric value
            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let id = s
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid {} id: '{}'", $label, s))?;
                Self::new(id)
            }
        }
    };
}

numeric_id!(
    /// Host platform course identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use gradeexport::domain::ids::CourseId;
    /// use std::str::FromStr;
    ///
    /// let id = CourseId::from_str("42").unwrap();
    /// assert_eq!(id.get(), 42);
    /// assert!(CourseId::new(0).is_err());
    /// ```
    CourseId,
    "course"
);

numeric_id!(
    /// Host platform user identifier
    UserId,
    "user"
);

numeric_id!(
    /// Host platform group identifier
    GroupId,
    "group"
);

/// Student identifier in the external grading system
///
/// Read from the user field the driver selects (username, idnumber or email).
///
/// # Examples
///
/// ```
/// use gradeexport::domain::ids::ExternalId;
///
/// let id = ExternalId::new("201900123").unwrap();
/// assert_eq!(id.as_str(), "201900123");
/// assert!(ExternalId::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExternalId(String);

impl ExternalId {
    /// Creates a new ExternalId from a string
    ///
    /// # Arguments
    ///
    /// * `id` - The external identifier string
    ///
    /// # Returns
    ///
    /// Returns `Ok(ExternalId)` if the ID is not blank, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("External id cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the external id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExternalId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ExternalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_parse() {
        assert_eq!(UserId::from_str("17").unwrap().get(), 17);
        assert_eq!(GroupId::from_str(" 3 ").unwrap().get(), 3);
        assert!(UserId::from_str("abc").is_err());
        assert!(CourseId::from_str("0").is_err());
    }

    #[test]
    fn test_numeric_id_ordering() {
        let mut ids = vec![UserId::new(9).unwrap(), UserId::new(2).unwrap()];
        ids.sort();
        assert_eq!(ids[0].get(), 2);
    }

    #[test]
    fn test_numeric_id_serde_is_transparent() {
        let id = CourseId::new(5).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "5");
        let back: CourseId = serde_json::from_str("5").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_external_id_validation() {
        assert!(ExternalId::new("u1").is_ok());
        assert!(ExternalId::new("").is_err());
        assert_eq!(ExternalId::from_str("abc123").unwrap().to_string(), "abc123");
    }
}
