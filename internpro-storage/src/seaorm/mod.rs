//! SeaORM implementation of the RBAC storage layer
//!
//! This module provides entities, migrations, repositories, and connection
//! management.

pub mod config;
pub mod connection;
pub mod entities;
pub mod filters;
pub mod migrations;
pub mod repositories;
pub mod soft_delete;

pub use config::DatabaseConfig;
pub use connection::{DatabaseConnection, DatabaseError};
pub use entities::*;
pub use filters::{ListQuery, Page};
pub use soft_delete::SoftDelete;

// Re-export common SeaORM types for convenience
pub use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection as SeaOrmConnection, DatabaseTransaction,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
pub use sea_orm_migration::{MigrationTrait, MigratorTrait, SchemaManager};
