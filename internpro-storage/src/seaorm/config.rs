use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Database configuration for SeaORM
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of idle connections kept open
    pub min_connections: u32,

    /// Connection timeout
    pub connection_timeout: Duration,

    /// Idle timeout for pooled connections
    pub idle_timeout: Duration,

    /// Maximum lifetime of a pooled connection
    pub max_lifetime: Duration,

    /// Log SQL statements at DEBUG level
    pub sqlx_logging: bool,
}

impl DatabaseConfig {
    /// Configuration for an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Default::default()
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(3600),
            sqlx_logging: false,
        }
    }
}

impl From<&internpro_config::DatabaseConfig> for DatabaseConfig {
    fn from(config: &internpro_config::DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connection_timeout: config.connection_timeout,
            idle_timeout: config.idle_timeout,
            max_lifetime: config.max_lifetime,
            sqlx_logging: config.sqlx_logging,
        }
    }
}
