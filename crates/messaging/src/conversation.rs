//! Pairwise conversations and their store.
//!
//! Each pair of users has exactly one conversation, stored under a key derived
//! from the two sorted user ids. A conversation that has never been written
//! is still addressable: resolving it yields an empty record that is only
//! persisted once a message is added.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kv_store::{get_json, set_json, KvStore};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::error::{MessagingError, Result};
use crate::message::{Message, MessageId};
use crate::user::UserId;
use crate::validation::validate_content;

/// Collection holding conversation records.
pub const CONVERSATION_COLLECTION: &str = "conversation";

/// Namespace token prefixed to every conversation key.
pub const CONVERSATION_KEY_PREFIX: &str = "conversation";

/// Number of tracked key locks above which idle ones are dropped.
const LOCK_PRUNE_THRESHOLD: usize = 1024;

/// Canonical storage key for the conversation between two users.
///
/// Independent of argument order: `conversation_key(a, b) == conversation_key(b, a)`.
pub fn conversation_key(a: &UserId, b: &UserId) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{}_{}_{}", CONVERSATION_KEY_PREFIX, first, second)
}

/// The ordered message log between exactly two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Both participants, sorted.
    participants: [UserId; 2],
    /// Messages in the order they were sent.
    messages: Vec<Message>,
    /// Highest id ever assigned. Deletion never lowers it.
    last_message_id: MessageId,
}

impl Conversation {
    /// An empty conversation between two distinct users.
    pub fn new(a: UserId, b: UserId) -> Result<Self> {
        if a == b {
            return Err(MessagingError::SelfConversation);
        }
        let participants = if a < b { [a, b] } else { [b, a] };
        Ok(Self {
            participants,
            messages: Vec::new(),
            last_message_id: 0,
        })
    }

    pub fn key(&self) -> String {
        conversation_key(&self.participants[0], &self.participants[1])
    }

    pub fn participants(&self) -> &[UserId; 2] {
        &self.participants
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message_id(&self) -> MessageId {
        self.last_message_id
    }

    /// The participant that is not `user`, if `user` takes part at all.
    pub fn counterpart(&self, user: &UserId) -> Option<&UserId> {
        match &self.participants {
            [a, b] if a == user => Some(b),
            [a, b] if b == user => Some(a),
            _ => None,
        }
    }

    /// Append a message and return its id.
    pub fn append(
        &mut self,
        content: &str,
        from: UserId,
        now: DateTime<Utc>,
    ) -> Result<MessageId> {
        validate_content(content)?;

        let id = self.last_message_id + 1;
        self.messages.push(Message::new(id, content, from, now));
        self.last_message_id = id;
        Ok(id)
    }

    /// Edit the content of a message sent by `from`.
    pub fn edit(
        &mut self,
        id: MessageId,
        from: &UserId,
        new_content: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let index = self.position(id, from)?;
        self.messages[index].edit_at(new_content, now)?;
        Ok(())
    }

    /// Remove a message sent by `from`. Later messages keep their ids.
    pub fn remove(&mut self, id: MessageId, from: &UserId) -> Result<Message> {
        let index = self.position(id, from)?;
        Ok(self.messages.remove(index))
    }

    /// A message that exists but was sent by someone else is reported as missing.
    fn position(&self, id: MessageId, from: &UserId) -> Result<usize> {
        self.messages
            .iter()
            .position(|m| m.id == id && &m.from == from)
            .ok_or(MessagingError::MessageNotFound { id })
    }

    /// An empty record for the same pair.
    fn blank(&self) -> Self {
        Self {
            participants: self.participants.clone(),
            messages: Vec::new(),
            last_message_id: 0,
        }
    }

    /// Raise the high-water mark if a stored record lags behind its messages.
    fn repair_high_water_mark(&mut self) {
        let max_id = self.messages.iter().map(|m| m.id).max().unwrap_or(0);
        if max_id > self.last_message_id {
            self.last_message_id = max_id;
        }
    }
}

/// Per-key exclusive locks, so read-modify-write cycles on one
/// conversation never interleave.
#[derive(Debug, Default)]
struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() >= LOCK_PRUNE_THRESHOLD {
                // Only the registry holds an idle lock.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(key.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Reads and writes conversation records.
///
/// The store is the only writer of conversation keys. Every mutation reloads
/// the record under that key's lock, applies the change to a copy, persists
/// it, and only then hands the new state back to the caller. A failed
/// mutation leaves both the caller's copy and the stored record untouched.
pub struct ConversationStore {
    store: Arc<dyn KvStore>,
    locks: KeyLocks,
}

impl ConversationStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            locks: KeyLocks::default(),
        }
    }

    /// Get the conversation between two users.
    ///
    /// Returns an empty, unsaved conversation if they have never exchanged a message.
    pub async fn resolve(&self, a: &UserId, b: &UserId) -> Result<Conversation> {
        let fresh = Conversation::new(a.clone(), b.clone())?;
        self.load_or(fresh).await
    }

    /// Add a message and persist the conversation.
    pub async fn add_message(
        &self,
        conversation: &mut Conversation,
        content: &str,
        from: &UserId,
    ) -> Result<MessageId> {
        validate_content(content)?;

        let key = conversation.key();
        let _guard = self.locks.acquire(&key).await;

        let mut next = self.load_or(conversation.blank()).await?;
        let id = next.append(content, from.clone(), Utc::now())?;
        self.persist(&key, &next).await?;

        debug!(conversation = %key, message_id = id, from = %from, "Message added");
        *conversation = next;
        Ok(id)
    }

    /// Edit a message previously sent by `from` and persist the conversation.
    pub async fn edit_message(
        &self,
        conversation: &mut Conversation,
        id: MessageId,
        new_content: &str,
        from: &UserId,
    ) -> Result<()> {
        let key = conversation.key();
        let _guard = self.locks.acquire(&key).await;

        let mut next = self.load_or(conversation.blank()).await?;
        next.edit(id, from, new_content, Utc::now())?;
        self.persist(&key, &next).await?;

        debug!(conversation = %key, message_id = id, from = %from, "Message edited");
        *conversation = next;
        Ok(())
    }

    /// Delete a message previously sent by `from` and persist the conversation.
    pub async fn delete_message(
        &self,
        conversation: &mut Conversation,
        id: MessageId,
        from: &UserId,
    ) -> Result<()> {
        let key = conversation.key();
        let _guard = self.locks.acquire(&key).await;

        let mut next = self.load_or(conversation.blank()).await?;
        next.remove(id, from)?;
        self.persist(&key, &next).await?;

        debug!(conversation = %key, message_id = id, from = %from, "Message deleted");
        *conversation = next;
        Ok(())
    }

    async fn load_or(&self, fresh: Conversation) -> Result<Conversation> {
        let key = fresh.key();
        let stored: Option<Conversation> =
            get_json(self.store.as_ref(), CONVERSATION_COLLECTION, &key).await?;

        let Some(mut conversation) = stored else {
            return Ok(fresh);
        };

        // Ids may contain `_`, so distinct pairs can share a key. A stored
        // record with equal participants never matches a fresh pair either.
        if conversation.participants != fresh.participants {
            warn!(
                conversation = %key,
                requested = ?fresh.participants,
                stored = ?conversation.participants,
                "Conversation key is held by another pair"
            );
            return Err(MessagingError::KeyCollision { key });
        }

        conversation.repair_high_water_mark();
        Ok(conversation)
    }

    async fn persist(&self, key: &str, conversation: &Conversation) -> Result<()> {
        set_json(self.store.as_ref(), CONVERSATION_COLLECTION, key, conversation).await?;
        Ok(())
    }
}
