//! Testing utilities for internpro-storage
//!
//! - `TestDatabase` - migrated SQLite database, file-backed or in-memory
//! - `fixtures` - ready-to-insert entity models
//!
//! ```toml
//! [dev-dependencies]
//! internpro-storage = { path = "../internpro-storage", features = ["testing"] }
//! ```

pub mod database;
pub mod fixtures;

pub use database::{TestDatabase, TestDatabaseError};
