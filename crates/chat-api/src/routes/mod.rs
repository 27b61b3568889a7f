//! Route handlers for the chat API.

pub mod chat;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Chat endpoints; the path user id is trusted as the caller
        .route(
            "/v1/chat/:userid",
            get(chat::list_conversations)
                .post(chat::send_message)
                .put(chat::edit_message)
                .delete(chat::delete_message),
        )
}
