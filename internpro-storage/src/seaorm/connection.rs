use super::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection as SeaConnection, DbErr, SqlErr};
use thiserror::Error;
use tracing::{debug, info};

/// Database connection wrapper with configuration
#[derive(Clone)]
pub struct DatabaseConnection {
    connection: SeaConnection,
    config: DatabaseConfig,
}

/// Database-related errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    DbError(DbErr),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DatabaseError {
    /// Whether the error came from a unique index rejecting a write
    pub fn is_conflict(&self) -> bool {
        matches!(self, DatabaseError::Conflict(_))
    }
}

impl From<DbErr> for DatabaseError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => DatabaseError::Conflict(message),
            _ => DatabaseError::DbError(err),
        }
    }
}

impl DatabaseConnection {
    /// Create a new database connection with configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self, DatabaseError> {
        info!("Connecting to database: {}", config.url);

        Self::ensure_sqlite_file_exists(&config.url)?;

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .connect_timeout(config.connection_timeout)
            .acquire_timeout(config.connection_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .sqlx_logging(config.sqlx_logging)
            .sqlx_logging_level(log::LevelFilter::Debug);

        let connection = Database::connect(opts).await?;

        debug!(
            "Database connection established with {} max connections",
            config.max_connections
        );

        Ok(Self { connection, config })
    }

    /// Ensure the parent directory of a file-based SQLite database exists
    fn ensure_sqlite_file_exists(database_url: &str) -> Result<(), DatabaseError> {
        if !database_url.starts_with("sqlite:") {
            debug!("Non-SQLite database detected, skipping file creation logic");
            return Ok(());
        }

        if database_url.contains(":memory:") {
            debug!("Using in-memory SQLite database");
            return Ok(());
        }

        let without_scheme = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .ok_or_else(|| {
                DatabaseError::ConfigError(format!("Invalid SQLite URL format: {}", database_url))
            })?;

        // Connection parameters such as `?mode=rwc` are not part of the path
        let file_path = without_scheme.split('?').next().unwrap_or(without_scheme);
        if file_path.is_empty() {
            return Err(DatabaseError::ConfigError(format!(
                "SQLite URL has no file path: {}",
                database_url
            )));
        }

        let path = std::path::Path::new(file_path);

        if let Some(parent_dir) = path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                info!("Creating database directory: {:?}", parent_dir);
                std::fs::create_dir_all(parent_dir).map_err(|e| {
                    DatabaseError::ConfigError(format!(
                        "Failed to create database directory {:?}: {}",
                        parent_dir, e
                    ))
                })?;
            }
        }

        if path.exists() {
            debug!("Using existing database file: {:?}", path);
        } else {
            info!("Database file will be created by SQLite: {:?}", path);
        }

        Ok(())
    }

    /// Get the underlying Sea-ORM connection
    pub fn get_connection(&self) -> &SeaConnection {
        &self.connection
    }

    /// Get database configuration
    pub fn get_config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        use sea_orm_migration::MigratorTrait;

        info!("Running database migrations");

        super::migrations::Migrator::up(&self.connection, None)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Check database connectivity
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        debug!("Pinging database");

        match self.connection.ping().await {
            Ok(_) => {
                debug!("Database ping successful");
                Ok(())
            }
            Err(e) => {
                debug!("Database ping failed: {}", e);
                Err(DatabaseError::DbError(e))
            }
        }
    }

    /// Close the database connection
    pub async fn close(self) -> Result<(), DatabaseError> {
        info!("Closing database connection");
        self.connection.close().await?;
        debug!("Database connection closed");
        Ok(())
    }
}
