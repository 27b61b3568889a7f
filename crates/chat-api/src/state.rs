//! Application state shared across handlers.

use std::sync::Arc;

use messaging::ChatService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Conversation store and buddy index.
    pub chat: Arc<ChatService>,
}

impl AppState {
    /// Create new application state.
    pub fn new(chat: ChatService) -> Self {
        Self {
            chat: Arc::new(chat),
        }
    }
}
