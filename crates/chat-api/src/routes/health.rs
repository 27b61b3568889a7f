//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
    /// Users present in the buddy index.
    pub users: usize,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        users: state.chat.buddies().user_count().await,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kv_store::MemoryStore;
    use messaging::ChatService;

    use super::*;

    #[tokio::test]
    async fn test_health_counts_known_users() {
        let chat = ChatService::open(Arc::new(MemoryStore::new()))
            .await
            .unwrap();
        let state = AppState::new(chat);

        let Json(body) = health(State(state.clone())).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.users, 0);

        let alice = state.chat.session("alice").unwrap();
        alice.send_message("bob", "hi").await.unwrap();

        let Json(body) = health(State(state)).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.users, 2);
    }
}
