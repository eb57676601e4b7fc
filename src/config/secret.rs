//! Grading service credentials
//!
//! The `[http]` token and password are held as [`SecretString`]: the text is
//! zeroized on drop, `Debug` prints `[REDACTED]` and reading it takes an
//! explicit `expose_secret()`. Serializing a config writes the placeholder
//! instead of the credential.

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroize;

/// Written in place of a credential when a config is serialized
pub const REDACTED: &str = "[REDACTED]";

/// Text of a token or password
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credential(String);

impl CloneableSecret for Credential {}
impl DebugSecret for Credential {}
impl SerializableSecret for Credential {}

impl Credential {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Credential(value)
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Credential)
    }
}

/// Token or password as kept in [`HttpDriverConfig`](super::HttpDriverConfig)
pub type SecretString = Secret<Credential>;

/// Wrap a token or password read from the environment
///
/// ```rust
/// use gradeexport::config::secret_string;
/// use secrecy::ExposeSecret;
///
/// let token = secret_string("grading-api-token".to_string());
/// assert_eq!(format!("Bearer {}", token.expose_secret()), "Bearer grading-api-token");
/// ```
pub fn secret_string(value: String) -> SecretString {
    Secret::new(Credential::from(value))
}

pub fn secret_string_opt(value: Option<String>) -> Option<SecretString> {
    value.map(secret_string)
}
