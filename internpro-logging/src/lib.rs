//! Logging infrastructure for InternPro
//!
//! All crates emit events through `tracing`; this crate installs the global
//! subscriber described by [`LoggingConfig`].

pub mod init;

pub use init::{build_env_filter, init_logging, init_simple_tracing};
pub use internpro_config::{LogFormat, LogLevel, LoggingConfig};
