//! Domain-driven configuration management for InternPro
//!
//! Configuration is split by functional domain (database, logging, rbac),
//! each with its own defaults and validation, and can be loaded from a YAML
//! file with `INTERNPRO_*` environment variable overrides.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    database::DatabaseConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    rbac::RbacSettings,
    InternproConfig,
};

// Re-export utilities
pub use domains::utils::{serde_duration, serde_duration_option};
