//! Message log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;
use crate::validation::{validate_content, ValidationError};

/// Identifier of a message, unique within one conversation.
pub type MessageId = u64;

/// A single entry in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Assigned by the conversation, starting at 1, never reused.
    pub id: MessageId,
    /// Message text.
    pub content: String,
    /// When the message was sent.
    pub created_at: DateTime<Utc>,
    /// When the message was last edited (equals `created_at` until then).
    pub updated_at: DateTime<Utc>,
    /// Sender.
    pub from: UserId,
}

impl Message {
    /// Create a message stamped with `now`.
    pub fn new(
        id: MessageId,
        content: impl Into<String>,
        from: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            created_at: now,
            updated_at: now,
            from,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_content(&self.content)
    }

    /// Replace the content and bump `updated_at`.
    ///
    /// If the new content is invalid, the message is left exactly as it was.
    pub fn edit(&mut self, new_content: impl Into<String>) -> Result<(), ValidationError> {
        self.edit_at(new_content, Utc::now())
    }

    pub(crate) fn edit_at(
        &mut self,
        new_content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let old_content = std::mem::replace(&mut self.content, new_content.into());
        let old_updated_at = std::mem::replace(&mut self.updated_at, now);

        if let Err(err) = self.validate() {
            self.content = old_content;
            self.updated_at = old_updated_at;
            return Err(err);
        }

        Ok(())
    }
}
