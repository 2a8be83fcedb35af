//! Configuration loading and environment variable handling

use crate::domains::logging::{LogFormat, LogLevel};
use crate::domains::InternproConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "INTERNPRO".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<InternproConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: InternproConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<InternproConfig> {
        let mut config = InternproConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<InternproConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut InternproConfig) -> ConfigResult<()> {
        self.apply_database_overrides(&mut config.database)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_rbac_overrides(&mut config.rbac)?;
        Ok(())
    }

    fn apply_database_overrides(
        &self,
        config: &mut crate::domains::database::DatabaseConfig,
    ) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("DATABASE_URL") {
            config.url = url;
        }

        if let Ok(max) = self.get_env_var("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = max.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid DATABASE_MAX_CONNECTIONS: {}", e))
            })?;
        }

        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    fn apply_rbac_overrides(
        &self,
        config: &mut crate::domains::rbac::RbacSettings,
    ) -> ConfigResult<()> {
        if let Ok(enabled) = self.get_env_var("RBAC_CACHE_ENABLED") {
            config.cache_enabled = enabled.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid RBAC_CACHE_ENABLED: {}", e))
            })?;
        }

        if let Ok(ttl) = self.get_env_var("RBAC_CACHE_TTL") {
            let seconds: u64 = ttl
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid RBAC_CACHE_TTL: {}", e)))?;
            config.cache_ttl = Duration::from_secs(seconds);
        }

        if let Ok(timeout) = self.get_env_var("RBAC_OPERATION_TIMEOUT") {
            let seconds: u64 = timeout.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid RBAC_OPERATION_TIMEOUT: {}", e))
            })?;
            config.operation_timeout = Some(Duration::from_secs(seconds));
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
