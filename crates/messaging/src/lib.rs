//! Two-party conversation log with a buddy index.
//!
//! Every pair of users shares exactly one ordered conversation. A side index
//! of "buddies" answers "who has this user talked to?" without scanning
//! conversations.
//!
//! - [`Message`] - A log entry; edits roll back if the new content is invalid
//! - [`ConversationStore`] - Resolves, appends to, edits and deletes from conversations
//! - [`BuddyIndex`] - In-memory symmetric adjacency, persisted as one document
//! - [`ChatService`] / [`UserSession`] - Operations keyed by counterpart user id
//!
//! # Architecture
//!
//! ```text
//! caller id + counterpart id
//!          ↓
//! ┌──────────────────────────────────────────────────┐
//! │                   UserSession                    │
//! │                                                  │
//! │  1. Normalize both ids                           │
//! │         ↓                                        │
//! │  2. Resolve conversation (ConversationStore)     │
//! │         ↓                                        │
//! │  3. Append / edit / delete under the key lock    │
//! │         ↓                                        │
//! │  4. Persist conversation record                  │
//! │         ↓                                        │
//! │  5. On send: register buddy pair (BuddyIndex)    │
//! └──────────────────────────────────────────────────┘
//!          ↓
//!      KvStore (conversation / buddies collections)
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use kv_store::MemoryStore;
//! use messaging::ChatService;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), messaging::MessagingError> {
//!     let service = ChatService::open(Arc::new(MemoryStore::new())).await?;
//!
//!     let alice = service.session("Alice")?;
//!     let id = alice.send_message("bob", "Hello").await?;
//!     assert_eq!(id, 1);
//!
//!     let conversations = service.session("bob")?.list_conversations().await?;
//!     assert_eq!(conversations.len(), 1);
//!     Ok(())
//! }
//! ```

mod buddies;
mod conversation;
mod error;
mod message;
mod session;
mod user;
mod validation;

pub use buddies::{BuddyIndex, BUDDIES_COLLECTION, BUDDIES_KEY};
pub use conversation::{
    conversation_key, Conversation, ConversationStore, CONVERSATION_COLLECTION,
    CONVERSATION_KEY_PREFIX,
};
pub use error::{ErrorKind, MessagingError, Result};
pub use message::{Message, MessageId};
pub use session::{ChatService, UserSession};
pub use user::UserId;
pub use validation::{validate_content, ValidationError};
