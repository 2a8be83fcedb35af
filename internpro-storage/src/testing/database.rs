//! Database testing utilities for internpro-storage

use crate::seaorm::{
    config::DatabaseConfig,
    connection::DatabaseConnection,
    repositories::RepositoryFactory,
};
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;

/// Migrated database that lives as long as the value
pub struct TestDatabase {
    _temp_dir: Option<TempDir>,
    pub connection: DatabaseConnection,
}

impl TestDatabase {
    /// Create a new file-backed SQLite test database in a temporary directory
    pub async fn new() -> Result<Self, TestDatabaseError> {
        let temp_dir =
            TempDir::new().map_err(|e| TestDatabaseError::TempDirCreation(e.to_string()))?;

        let db_path = temp_dir.path().join("test.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_path.display()),
            max_connections: 5,
            connection_timeout: Duration::from_secs(5),
            ..Default::default()
        };

        let connection = Self::connect(config).await?;

        Ok(Self {
            _temp_dir: Some(temp_dir),
            connection,
        })
    }

    /// Create an in-memory SQLite database (faster for tests)
    ///
    /// The pool holds a single connection, so the schema survives for the
    /// lifetime of the value.
    pub async fn new_in_memory() -> Result<Self, TestDatabaseError> {
        let config = DatabaseConfig {
            connection_timeout: Duration::from_secs(5),
            ..DatabaseConfig::in_memory()
        };

        let connection = Self::connect(config).await?;

        Ok(Self {
            _temp_dir: None,
            connection,
        })
    }

    async fn connect(config: DatabaseConfig) -> Result<DatabaseConnection, TestDatabaseError> {
        let connection = DatabaseConnection::new(config)
            .await
            .map_err(|e| TestDatabaseError::Connection(e.to_string()))?;

        connection
            .migrate()
            .await
            .map_err(|e| TestDatabaseError::Migration(e.to_string()))?;

        Ok(connection)
    }

    /// Repositories sharing this database
    pub fn repositories(&self) -> RepositoryFactory {
        RepositoryFactory::new(self.connection.clone())
    }
}

/// Test database errors
#[derive(Error, Debug)]
pub enum TestDatabaseError {
    #[error("Failed to create temporary directory: {0}")]
    TempDirCreation(String),

    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}
