//! Authorization core configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings consumed by the authorization engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacSettings {
    /// Page size used when a list request asks for none or an invalid one
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Largest page size a list request may ask for
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,

    /// Whether role/permission check results are cached in-process
    #[serde(default = "crate::domains::utils::default_false")]
    pub cache_enabled: bool,

    /// Time-to-live of a cached decision
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_cache_ttl")]
    pub cache_ttl: Duration,

    /// Maximum number of cached decisions
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Upper bound for checks and assignment operations
    #[serde(
        with = "crate::domains::utils::serde_duration_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub operation_timeout: Option<Duration>,

    /// Role slugs accepted by the admin route guard
    #[serde(default = "default_admin_role_slugs")]
    pub admin_role_slugs: Vec<String>,

    /// Role slug of the super administrator
    #[serde(default = "default_super_admin_slug")]
    pub super_admin_slug: String,

    /// Whether default roles, permissions and menus are created on startup
    #[serde(default = "crate::domains::utils::default_false")]
    pub seed_initial_data: bool,
}

impl Default for RbacSettings {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            cache_enabled: false,
            cache_ttl: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
            operation_timeout: None,
            admin_role_slugs: default_admin_role_slugs(),
            super_admin_slug: default_super_admin_slug(),
            seed_initial_data: false,
        }
    }
}

impl Validatable for RbacSettings {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.default_page_size, "default_page_size", self.domain_name())?;
        validate_positive(self.max_page_size, "max_page_size", self.domain_name())?;

        if self.default_page_size > self.max_page_size {
            return Err(self.validation_error(
                "default_page_size cannot be greater than max_page_size",
            ));
        }

        if self.cache_enabled {
            validate_positive(self.cache_ttl.as_secs(), "cache_ttl", self.domain_name())?;
            validate_positive(self.cache_capacity, "cache_capacity", self.domain_name())?;
        }

        if let Some(timeout) = self.operation_timeout {
            if timeout.is_zero() {
                return Err(self.validation_error("operation_timeout must be greater than 0"));
            }
        }

        validate_required_string(&self.super_admin_slug, "super_admin_slug", self.domain_name())?;
        for slug in &self.admin_role_slugs {
            validate_required_string(slug, "admin_role_slugs", self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "rbac"
    }
}

fn default_page_size() -> u64 {
    10
}

fn default_max_page_size() -> u64 {
    100
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(60)
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_admin_role_slugs() -> Vec<String> {
    vec!["super-admin".to_string(), "admin".to_string()]
}

fn default_super_admin_slug() -> String {
    "super-admin".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rbac_defaults() {
        let settings = RbacSettings::default();
        assert_eq!(settings.default_page_size, 10);
        assert_eq!(settings.max_page_size, 100);
        assert!(!settings.cache_enabled);
        assert!(settings.operation_timeout.is_none());
        assert_eq!(settings.super_admin_slug, "super-admin");
        assert_eq!(settings.admin_role_slugs, vec!["super-admin", "admin"]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_default_page_above_max_is_rejected() {
        let settings = RbacSettings {
            default_page_size: 200,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_operation_timeout_is_rejected() {
        let settings = RbacSettings {
            operation_timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_cache_settings_only_checked_when_enabled() {
        let mut settings = RbacSettings {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_ok());

        settings.cache_enabled = true;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_operation_timeout_from_yaml() {
        let settings: RbacSettings = serde_yaml::from_str("operation_timeout: 3\n").unwrap();
        assert_eq!(settings.operation_timeout, Some(Duration::from_secs(3)));
    }
}
