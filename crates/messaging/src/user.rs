//! Normalized user identities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MessagingError;

/// A normalized user id: lower-cased, surrounding whitespace trimmed, never empty.
///
/// Two raw ids name the same user iff their normalized forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Normalize a raw, caller-supplied id.
    pub fn parse(raw: &str) -> Result<Self, MessagingError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(MessagingError::InvalidUser(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = MessagingError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}
