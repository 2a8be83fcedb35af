//! Domain-specific configuration modules

pub mod database;
pub mod logging;
pub mod rbac;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main InternPro configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InternproConfig {
    /// Relational store configuration
    #[serde(default)]
    pub database: database::DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,

    /// Authorization core configuration
    #[serde(default)]
    pub rbac: rbac::RbacSettings,
}

impl InternproConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.database.validate()?;
        self.logging.validate()?;
        self.rbac.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = InternproConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = InternproConfig::default();
        assert!(config.validate_all().is_ok());
    }

    #[test]
    fn test_sample_round_trips_through_yaml() {
        let sample = InternproConfig::generate_sample();
        assert!(sample.contains("database"));
        assert!(sample.contains("rbac"));

        let parsed: InternproConfig = serde_yaml::from_str(&sample).unwrap();
        assert_eq!(parsed.rbac.default_page_size, 10);
        assert!(parsed.validate_all().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
rbac:
  cache_enabled: true
"#;
        let config: InternproConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.rbac.cache_enabled);
        assert_eq!(config.rbac.max_page_size, 100);
        assert_eq!(config.database.url, "sqlite://internpro.db?mode=rwc");
    }
}
