//! Caller-facing operations keyed by counterpart user id.

use std::sync::Arc;

use kv_store::KvStore;
use tracing::{debug, info, warn};

use crate::buddies::BuddyIndex;
use crate::conversation::{Conversation, ConversationStore};
use crate::error::{MessagingError, Result};
use crate::message::MessageId;
use crate::user::UserId;

/// Conversation store and buddy index shared by all sessions.
///
/// Construction loads the buddy index, so no session can run before the
/// index is ready.
pub struct ChatService {
    conversations: ConversationStore,
    buddies: BuddyIndex,
}

impl ChatService {
    /// Open the service on top of a store, loading the buddy index.
    pub async fn open(store: Arc<dyn KvStore>) -> Result<Self> {
        let buddies = BuddyIndex::load(store.clone()).await?;
        info!("Chat service ready");
        Ok(Self {
            conversations: ConversationStore::new(store),
            buddies,
        })
    }

    /// Start a session for a raw caller id.
    pub fn session(&self, raw_caller: &str) -> Result<UserSession<'_>> {
        let user = UserId::parse(raw_caller)?;
        Ok(UserSession {
            service: self,
            user,
        })
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn buddies(&self) -> &BuddyIndex {
        &self.buddies
    }
}

/// Operations performed on behalf of one caller.
pub struct UserSession<'a> {
    service: &'a ChatService,
    user: UserId,
}

impl UserSession<'_> {
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// The conversation with a counterpart, empty if they never talked.
    pub async fn conversation_with(&self, counterpart_raw: &str) -> Result<Conversation> {
        let counterpart = UserId::parse(counterpart_raw)?;
        self.service
            .conversations
            .resolve(&self.user, &counterpart)
            .await
    }

    /// Everyone the caller has conversed with, sorted.
    pub async fn buddies(&self) -> Vec<UserId> {
        self.service
            .buddies
            .buddies_of(&self.user)
            .await
            .into_iter()
            .collect()
    }

    /// Send a message and return its id.
    ///
    /// The message is persisted before the buddy index is updated. If that
    /// second write fails the message stays saved and
    /// [`MessagingError::BuddyIndexStale`] carries its id; the next successful
    /// send between the same pair registers them again.
    pub async fn send_message(&self, recipient_raw: &str, content: &str) -> Result<MessageId> {
        let recipient = UserId::parse(recipient_raw)?;
        let conversations = &self.service.conversations;

        let mut conversation = conversations.resolve(&self.user, &recipient).await?;
        let message_id = conversations
            .add_message(&mut conversation, content, &self.user)
            .await?;

        if let Err(err) = self
            .service
            .buddies
            .register_pair(&self.user, &recipient)
            .await
        {
            warn!(
                from = %self.user,
                to = %recipient,
                message_id,
                error = %err,
                "Message saved but buddy index not updated"
            );
            return Err(match err {
                MessagingError::Store(source) => {
                    MessagingError::BuddyIndexStale { message_id, source }
                }
                other => other,
            });
        }

        debug!(from = %self.user, to = %recipient, message_id, "Message sent");
        Ok(message_id)
    }

    /// Edit a message the caller sent to `recipient_raw`.
    pub async fn edit_message(
        &self,
        recipient_raw: &str,
        message_id: MessageId,
        new_content: &str,
    ) -> Result<()> {
        let recipient = UserId::parse(recipient_raw)?;
        let conversations = &self.service.conversations;

        let mut conversation = conversations.resolve(&self.user, &recipient).await?;
        conversations
            .edit_message(&mut conversation, message_id, new_content, &self.user)
            .await
    }

    /// Delete a message the caller sent to `recipient_raw`.
    pub async fn delete_message(&self, recipient_raw: &str, message_id: MessageId) -> Result<()> {
        let recipient = UserId::parse(recipient_raw)?;
        let conversations = &self.service.conversations;

        let mut conversation = conversations.resolve(&self.user, &recipient).await?;
        conversations
            .delete_message(&mut conversation, message_id, &self.user)
            .await
    }

    /// All of the caller's conversations, ordered by counterpart id.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let buddies = self.service.buddies.buddies_of(&self.user).await;

        let mut conversations = Vec::with_capacity(buddies.len());
        for buddy in &buddies {
            conversations.push(
                self.service
                    .conversations
                    .resolve(&self.user, buddy)
                    .await?,
            );
        }
        Ok(conversations)
    }
}
