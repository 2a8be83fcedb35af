//! Configuration for the RBAC engine

use internpro_config::RbacSettings;
use internpro_storage::ListQuery;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::PaginationMeta;

/// Engine configuration, derived from the `rbac` section of the service config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RbacConfig {
    /// Page size used when a request gives none or an out-of-range one
    pub default_page_size: u64,

    /// Largest accepted page size
    pub max_page_size: u64,

    /// Whether authorization decisions are cached
    pub enable_cache: bool,

    /// Lifetime of a cached decision
    pub cache_ttl: Duration,

    /// Maximum number of cached decisions
    pub cache_capacity: u64,

    /// Deadline applied to checks and assignment operations
    pub operation_timeout: Option<Duration>,

    /// Role slugs that satisfy the admin guard
    pub admin_role_slugs: Vec<String>,

    /// Role slug of the super administrator
    pub super_admin_slug: String,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self::from(&RbacSettings::default())
    }
}

impl From<&RbacSettings> for RbacConfig {
    fn from(settings: &RbacSettings) -> Self {
        Self {
            default_page_size: settings.default_page_size,
            max_page_size: settings.max_page_size,
            enable_cache: settings.cache_enabled,
            cache_ttl: settings.cache_ttl,
            cache_capacity: settings.cache_capacity,
            operation_timeout: settings.operation_timeout,
            admin_role_slugs: settings.admin_role_slugs.clone(),
            super_admin_slug: settings.super_admin_slug.clone(),
        }
    }
}

impl RbacConfig {
    /// Normalise paging input: page below 1 becomes 1, a limit outside
    /// `1..=max_page_size` falls back to the default page size.
    pub fn list_query(&self, page: u64, limit: u64, search: Option<&str>) -> ListQuery {
        let page = page.max(1);
        let limit = if limit == 0 || limit > self.max_page_size {
            self.default_page_size
        } else {
            limit
        };

        let query = ListQuery::new(page, limit);
        match search {
            Some(term) => query.with_search(term),
            None => query,
        }
    }

    /// Pagination metadata for a normalised query and the total row count
    pub fn pagination_meta(&self, query: &ListQuery, total_items: u64) -> PaginationMeta {
        PaginationMeta {
            page: query.page,
            limit: query.limit,
            total_pages: total_items.div_ceil(query.limit.max(1)),
            total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_settings() {
        let config = RbacConfig::default();
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_page_size, 100);
        assert!(!config.enable_cache);
        assert_eq!(config.super_admin_slug, "super-admin");
        assert!(config.operation_timeout.is_none());
    }

    #[test]
    fn test_list_query_clamping() {
        let config = RbacConfig::default();

        let query = config.list_query(0, 0, None);
        assert_eq!((query.page, query.limit), (1, 10));

        let query = config.list_query(3, 500, None);
        assert_eq!((query.page, query.limit), (3, 10));

        let query = config.list_query(2, 100, Some("admin"));
        assert_eq!((query.page, query.limit), (2, 100));
        assert_eq!(query.search_term(), Some("admin"));
    }

    #[test]
    fn test_pagination_meta_rounds_up() {
        let config = RbacConfig::default();
        let query = config.list_query(1, 10, None);

        assert_eq!(config.pagination_meta(&query, 0).total_pages, 0);
        assert_eq!(config.pagination_meta(&query, 10).total_pages, 1);
        assert_eq!(config.pagination_meta(&query, 11).total_pages, 2);
    }
}
