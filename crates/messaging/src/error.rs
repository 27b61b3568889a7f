//! Error types for messaging operations.

use kv_store::StoreError;
use thiserror::Error;

use crate::message::MessageId;
use crate::validation::ValidationError;

/// Errors that can occur while reading or mutating conversations.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The user id was blank after normalization.
    #[error("invalid user id: {0:?}")]
    InvalidUser(String),

    /// Both sides of a conversation are the same user.
    #[error("cannot have a conversation with yourself")]
    SelfConversation,

    /// Both sides of a buddy pair are the same user.
    #[error("cannot register a user as their own buddy")]
    SelfBuddy,

    /// Message content failed validation.
    #[error("message validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The conversation key is already used by a different pair of users.
    #[error("conversation key {key} belongs to another pair of users")]
    KeyCollision { key: String },

    /// No message with this id was sent by the caller.
    #[error("no message found with id {id}")]
    MessageNotFound { id: MessageId },

    /// The underlying store failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The message was persisted but the buddy index could not be updated.
    #[error("message {message_id} was saved but the buddy index is stale: {source}")]
    BuddyIndexStale {
        message_id: MessageId,
        #[source]
        source: StoreError,
    },
}

/// Coarse error classes a client can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself was wrong.
    BadInput,
    /// The addressed message does not exist for this caller.
    NotFound,
    /// The store could not serve the request.
    StorageUnavailable,
    /// A write succeeded but a dependent write did not.
    Inconsistent,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadInput => "bad_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::StorageUnavailable => "storage_unavailable",
            ErrorKind::Inconsistent => "buddy_index_stale",
        }
    }
}

impl MessagingError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MessagingError::InvalidUser(_)
            | MessagingError::SelfConversation
            | MessagingError::SelfBuddy
            | MessagingError::Validation(_)
            | MessagingError::KeyCollision { .. } => ErrorKind::BadInput,
            MessagingError::MessageNotFound { .. } => ErrorKind::NotFound,
            MessagingError::Store(_) => ErrorKind::StorageUnavailable,
            MessagingError::BuddyIndexStale { .. } => ErrorKind::Inconsistent,
        }
    }
}

/// Result type for messaging operations.
pub type Result<T> = std::result::Result<T, MessagingError>;
