//! Key/value persistence layer for the chat log.
//!
//! The chat core only needs exact-key `get`/`set` over named collections.
//! This crate provides that capability as the [`KvStore`] trait, with a
//! SQLite implementation ([`Database`]) and an in-memory one ([`MemoryStore`]).
//!
//! # Example
//!
//! ```no_run
//! use kv_store::{Database, KvStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:chat.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     db.set("conversation", "conversation_alice_bob", "{}").await?;
//!     let value = db.get("conversation", "conversation_alice_bob").await?;
//!     assert!(value.is_some());
//!
//!     Ok(())
//! }
//! ```

pub mod entry;
pub mod error;
mod memory;
mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use store::{get_json, set_json, KvStore};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    pub const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> kv_store::Result<()> {
    /// // File database
    /// let db = kv_store::Database::connect("sqlite:data/chat.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing); every connection gets its own
    /// // memory database, so keep the pool at one connection.
    /// let db = kv_store::Database::connect_with_pool_size("sqlite::memory:", 1).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl KvStore for Database {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<String>> {
        entry::get_entry(&self.pool, collection, key).await
    }

    async fn set(&self, collection: &str, key: &str, value: &str) -> Result<()> {
        entry::upsert_entry(&self.pool, collection, key, value).await
    }
}
