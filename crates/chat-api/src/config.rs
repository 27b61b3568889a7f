//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Chat API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Connection pool size.
    pub pool_size: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CHAT_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:chat.db?mode=rwc` |
    /// | `SQLITE_POOL_SIZE` | Connection pool size | `20` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("CHAT_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url =
            lookup("SQLITE_PATH").unwrap_or_else(|| "sqlite:chat.db?mode=rwc".to_string());

        let pool_size = match lookup("SQLITE_POOL_SIZE") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or(ConfigError::InvalidPoolSize(value))?,
            None => kv_store::Database::DEFAULT_POOL_SIZE,
        };

        Ok(Self {
            addr,
            database_url,
            pool_size,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid CHAT_ADDR format")]
    InvalidAddr,

    #[error("Invalid SQLITE_POOL_SIZE: {0:?}")]
    InvalidPoolSize(String),
}
