//! Single entry point bundling every RBAC component

use internpro_storage::RepositoryFactory;
use std::sync::Arc;

use crate::{
    assignments::AssignmentManager,
    cache::DecisionCache,
    config::RbacConfig,
    enforcer::{Authorizer, RbacEnforcer},
    menu_tree::MenuTreeResolver,
    menus::MenuManager,
    middleware::RbacGuard,
    permissions::PermissionManager,
    roles::RoleManager,
};

/// RBAC engine. All components share one repository set and one decision
/// cache, so a mutation through any manager invalidates cached checks.
#[derive(Clone)]
pub struct RbacService {
    pub roles: RoleManager,
    pub permissions: PermissionManager,
    pub menus: MenuManager,
    pub assignments: AssignmentManager,
    pub enforcer: RbacEnforcer,
    pub menu_tree: MenuTreeResolver,
    config: RbacConfig,
    cache: DecisionCache,
}

impl RbacService {
    /// Build the engine over `repositories`
    pub fn new(repositories: &RepositoryFactory, config: RbacConfig) -> Self {
        let cache = DecisionCache::from_config(&config);

        Self {
            roles: RoleManager::new(repositories, config.clone(), cache.clone()),
            permissions: PermissionManager::new(repositories, config.clone(), cache.clone()),
            menus: MenuManager::new(repositories, config.clone(), cache.clone()),
            assignments: AssignmentManager::new(repositories, config.clone(), cache.clone()),
            enforcer: RbacEnforcer::new(repositories, config.clone(), cache.clone()),
            menu_tree: MenuTreeResolver::new(repositories),
            config,
            cache,
        }
    }

    pub fn config(&self) -> &RbacConfig {
        &self.config
    }

    pub fn cache(&self) -> &DecisionCache {
        &self.cache
    }

    /// The enforcer as a shareable trait object for guards and other services
    pub fn authorizer(&self) -> Arc<dyn Authorizer> {
        Arc::new(self.enforcer.clone())
    }

    /// Guard requiring a permission on `(resource, action)`
    pub fn require_permission(&self, resource: &str, action: &str) -> RbacGuard {
        RbacGuard::permission(self.authorizer(), resource, action)
    }

    /// Guard requiring the role with `slug`
    pub fn require_role(&self, slug: &str) -> RbacGuard {
        RbacGuard::role(self.authorizer(), slug)
    }

    /// Guard requiring one of the configured admin roles
    pub fn require_admin(&self) -> RbacGuard {
        RbacGuard::admin(self.authorizer(), &self.config)
    }

    /// Guard requiring the super administrator role
    pub fn require_super_admin(&self) -> RbacGuard {
        RbacGuard::super_admin(self.authorizer(), &self.config)
    }
}
