//! Persistence adapter for the InternPro RBAC core
//!
//! This crate owns the relational schema for roles, permissions, menus and
//! their junction tables, together with the SeaORM repositories the
//! authorization engine calls into.

pub mod seaorm;

// Testing utilities (feature-gated)
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use seaorm::{
    config::DatabaseConfig,
    connection::{DatabaseConnection, DatabaseError},
    filters::{ListQuery, Page},
    repositories::RepositoryFactory,
    soft_delete::SoftDelete,
};
