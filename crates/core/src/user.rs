//! User identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length of any user-supplied text field, matching the VARCHAR(255) columns.
pub const MAX_FIELD_LEN: usize = 255;

/// Unique identifier for a user.
///
/// Generated server-side at signup and never supplied by clients. Route
/// parameters are compared against it as plain strings.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Generate a new random user ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an identifier read back from storage or a session.
    pub fn from_stored(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this ID refers to the same user as a raw route parameter.
    pub fn matches(&self, raw: &str) -> bool {
        self.0 == raw
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated signup input.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub password: String,
}

impl NewUser {
    /// Validate raw signup fields. All three are required and non-empty.
    pub fn parse(name: &str, username: &str, password: &str) -> crate::Result<Self> {
        let name = name.trim();
        let username = username.trim();

        let mut missing = Vec::new();
        if name.is_empty() {
            missing.push("name");
        }
        if username.is_empty() {
            missing.push("username");
        }
        if password.is_empty() {
            missing.push("password");
        }
        if !missing.is_empty() {
            return Err(crate::Error::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        for (field, value) in [("name", name), ("username", username)] {
            if value.chars().count() > MAX_FIELD_LEN {
                return Err(crate::Error::Validation(format!(
                    "{field} must be at most {MAX_FIELD_LEN} characters"
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}
