//! HTTP interface for the two-party chat log.
//!
//! Serves `/v1/chat/:userid` (list, send, edit, delete) on top of a SQLite
//! key/value store. The buddy index is loaded before the listener starts.

mod config;
mod error;
mod response;
mod routes;
mod state;

use std::sync::Arc;

use kv_store::Database;
use messaging::ChatService;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

const DEFAULT_LOG_FILTER: &str = "chat_api=info,messaging=info,kv_store=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting chat API server");

    // Connect to database
    let db = Database::connect_with_pool_size(&config.database_url, config.pool_size).await?;
    db.migrate().await?;

    // Load the buddy index before accepting requests
    let chat = ChatService::open(Arc::new(db)).await?;

    // Build application state
    let state = AppState::new(chat);

    // Build router
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "Chat API server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
