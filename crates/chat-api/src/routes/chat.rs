//! Chat routes: list, send, edit and delete messages.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use messaging::{Conversation, Message, MessageId, UserId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, Result};
use crate::response::ApiResponse;
use crate::state::AppState;

/// A conversation as seen by one of its participants.
#[derive(Debug, Serialize)]
pub struct ConversationView {
    /// The other participant.
    pub with: String,
    pub messages: Vec<Message>,
    pub last_message_id: MessageId,
}

impl ConversationView {
    fn for_user(conversation: Conversation, user: &UserId) -> Self {
        let with = conversation
            .counterpart(user)
            .map(|id| id.to_string())
            .unwrap_or_default();
        Self {
            with,
            last_message_id: conversation.last_message_id(),
            messages: conversation.messages().to_vec(),
        }
    }
}

/// Request to send a message.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub to: String,
    pub content: String,
}

/// Id assigned to a sent message.
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub message_id: MessageId,
}

/// Request to edit a message.
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub to: String,
    pub message_id: MessageId,
    pub content: String,
}

/// Request to delete a message.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub to: String,
    pub message_id: MessageId,
}

/// List all conversations of the user.
pub async fn list_conversations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ConversationView>>>> {
    let session = state.chat.session(&user_id)?;
    let conversations = session.list_conversations().await?;

    let views = conversations
        .into_iter()
        .map(|c| ConversationView::for_user(c, session.user()))
        .collect();

    Ok(Json(ApiResponse::ok(views)))
}

/// Send a message from the user.
pub async fn send_message(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: std::result::Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SendResponse>>> {
    let Json(req) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let session = state.chat.session(&user_id)?;

    let message_id = session.send_message(&req.to, &req.content).await?;
    info!(from = %session.user(), message_id, "Message sent");

    Ok(Json(ApiResponse::ok(SendResponse { message_id })))
}

/// Edit a message the user sent.
pub async fn edit_message(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: std::result::Result<Json<EditRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<&'static str>>> {
    let Json(req) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let session = state.chat.session(&user_id)?;

    session
        .edit_message(&req.to, req.message_id, &req.content)
        .await?;
    info!(from = %session.user(), message_id = req.message_id, "Message edited");

    Ok(Json(ApiResponse::ok("Message updated")))
}

/// Delete a message the user sent.
pub async fn delete_message(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: std::result::Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<&'static str>>> {
    let Json(req) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let session = state.chat.session(&user_id)?;

    session.delete_message(&req.to, req.message_id).await?;
    info!(from = %session.user(), message_id = req.message_id, "Message deleted");

    Ok(Json(ApiResponse::ok("Message deleted")))
}
