//! Authorization predicates
//!
//! A user holds a permission when some active, non-deleted role assigned to
//! them is granted an active, non-deleted permission with exactly that
//! `(resource, action)`. Role checks follow the same rules on the slug.

use async_trait::async_trait;
use internpro_storage::seaorm::repositories::AssignmentRepository;
use internpro_storage::RepositoryFactory;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    cache::{DecisionCache, DecisionKey},
    config::RbacConfig,
    deadline::bounded,
    error::{RbacError, RbacResult},
};

/// The checks route guards and other services call per request
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Whether the user holds a permission on `(resource, action)`
    async fn check_user_permission(&self, user_id: Uuid, resource: &str, action: &str) -> RbacResult<bool>;

    /// Whether the user holds the role with `role_slug`
    async fn check_user_role(&self, user_id: Uuid, role_slug: &str) -> RbacResult<bool>;

    /// Whether the user holds any of the roles, stopping at the first match
    async fn check_user_any_role(&self, user_id: Uuid, role_slugs: &[String]) -> RbacResult<bool> {
        for slug in role_slugs {
            if self.check_user_role(user_id, slug).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether the user holds any of the `(resource, action)` permissions,
    /// stopping at the first match
    async fn check_user_any_permission(
        &self,
        user_id: Uuid,
        permissions: &[(String, String)],
    ) -> RbacResult<bool> {
        for (resource, action) in permissions {
            if self.check_user_permission(user_id, resource, action).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Database-backed authorizer with optional decision caching
#[derive(Clone)]
pub struct RbacEnforcer {
    assignments: AssignmentRepository,
    config: RbacConfig,
    cache: DecisionCache,
}

impl RbacEnforcer {
    /// Create a new enforcer
    pub fn new(repositories: &RepositoryFactory, config: RbacConfig, cache: DecisionCache) -> Self {
        Self {
            assignments: repositories.assignment_repository(),
            config,
            cache,
        }
    }

    /// Whether a role has been granted the active permission with `permission_slug`
    #[instrument(skip(self))]
    pub async fn check_role_has_permission(
        &self,
        role_id: Uuid,
        permission_slug: &str,
    ) -> RbacResult<bool> {
        let key = DecisionKey::RolePermission {
            role_id,
            slug: permission_slug.to_string(),
        };

        self.decide(key, "check role permission", async {
            let count = self
                .assignments
                .count_role_permission(role_id, permission_slug)
                .await
                .map_err(|e| RbacError::storage("check role permission", e))?;
            Ok(count > 0)
        })
        .await
    }

    /// Look the decision up in the cache, else evaluate it under the
    /// configured deadline and remember the answer unless the cache was
    /// invalidated while evaluating.
    async fn decide<F>(&self, key: DecisionKey, operation: &'static str, evaluate: F) -> RbacResult<bool>
    where
        F: std::future::Future<Output = RbacResult<bool>> + Send,
    {
        if let Some(allowed) = self.cache.get(&key).await {
            debug!(?key, allowed, "Authorization decision served from cache");
            return Ok(allowed);
        }

        let generation = self.cache.generation();
        let allowed = bounded(self.config.operation_timeout, operation, evaluate).await?;
        let cached = self.cache.insert(key.clone(), allowed, generation).await;

        debug!(?key, allowed, cached, "Authorization decision evaluated");
        Ok(allowed)
    }
}

#[async_trait]
impl Authorizer for RbacEnforcer {
    #[instrument(skip(self))]
    async fn check_user_permission(&self, user_id: Uuid, resource: &str, action: &str) -> RbacResult<bool> {
        let key = DecisionKey::UserPermission {
            user_id,
            resource: resource.to_string(),
            action: action.to_string(),
        };

        self.decide(key, "check user permission", async {
            let count = self
                .assignments
                .count_user_permission(user_id, resource, action)
                .await
                .map_err(|e| RbacError::storage("check user permission", e))?;
            Ok(count > 0)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn check_user_role(&self, user_id: Uuid, role_slug: &str) -> RbacResult<bool> {
        let key = DecisionKey::UserRole {
            user_id,
            slug: role_slug.to_string(),
        };

        self.decide(key, "check user role", async {
            let count = self
                .assignments
                .count_user_role(user_id, role_slug)
                .await
                .map_err(|e| RbacError::storage("check user role", e))?;
            Ok(count > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use internpro_storage::seaorm::entities::roles;
    use internpro_storage::testing::{fixtures, TestDatabase};

    use crate::assignments::AssignmentManager;

    struct Granted {
        db: TestDatabase,
        role: roles::Model,
        user_id: Uuid,
    }

    /// User holding role `editor`, which grants users:create
    async fn granted() -> Granted {
        let db = TestDatabase::new_in_memory().await.unwrap();
        let repos = db.repositories();

        let role = repos.role_repo.create(fixtures::role("editor")).await.unwrap();
        let create = repos
            .permission_repo
            .create(fixtures::permission("create-user", "users", "create"))
            .await
            .unwrap();
        repos
            .assignment_repo
            .replace_role_permissions(role.id, &[create.id], None)
            .await
            .unwrap();

        let user_id = Uuid::new_v4();
        repos
            .assignment_repo
            .replace_user_roles(user_id, &[role.id], None)
            .await
            .unwrap();

        Granted { db, role, user_id }
    }

    fn enforcer(db: &TestDatabase, cache: DecisionCache) -> RbacEnforcer {
        RbacEnforcer::new(&db.repositories(), RbacConfig::default(), cache)
    }

    #[tokio::test]
    async fn test_exact_permission_match() {
        let g = granted().await;
        let enforcer = enforcer(&g.db, DecisionCache::disabled());

        assert!(enforcer.check_user_permission(g.user_id, "users", "create").await.unwrap());
        assert!(!enforcer.check_user_permission(g.user_id, "users", "delete").await.unwrap());
        assert!(!enforcer.check_user_permission(g.user_id, "Users", "create").await.unwrap());
        assert!(!enforcer.check_user_permission(Uuid::new_v4(), "users", "create").await.unwrap());
    }

    #[tokio::test]
    async fn test_role_check_by_slug() {
        let g = granted().await;
        let enforcer = enforcer(&g.db, DecisionCache::disabled());

        assert!(enforcer.check_user_role(g.user_id, "editor").await.unwrap());
        assert!(!enforcer.check_user_role(g.user_id, "admin").await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_role_grants_nothing() {
        let g = granted().await;
        let enforcer = enforcer(&g.db, DecisionCache::disabled());

        let mut role = g.role.clone();
        role.is_active = false;
        g.db.repositories().role_repo.update(role).await.unwrap();

        assert!(!enforcer.check_user_role(g.user_id, "editor").await.unwrap());
        assert!(!enforcer.check_user_permission(g.user_id, "users", "create").await.unwrap());
    }

    #[tokio::test]
    async fn test_deleted_role_grants_nothing() {
        let g = granted().await;
        let enforcer = enforcer(&g.db, DecisionCache::disabled());

        g.db.repositories().role_repo.soft_delete(g.role.id, None).await.unwrap();

        assert!(!enforcer.check_user_role(g.user_id, "editor").await.unwrap());
        assert!(!enforcer.check_user_permission(g.user_id, "users", "create").await.unwrap());
    }

    #[tokio::test]
    async fn test_any_role_and_any_permission() {
        let g = granted().await;
        let enforcer = enforcer(&g.db, DecisionCache::disabled());

        let slugs = vec!["admin".to_string(), "editor".to_string()];
        assert!(enforcer.check_user_any_role(g.user_id, &slugs).await.unwrap());
        assert!(!enforcer.check_user_any_role(g.user_id, &[]).await.unwrap());

        let pairs = vec![
            ("users".to_string(), "delete".to_string()),
            ("users".to_string(), "create".to_string()),
        ];
        assert!(enforcer.check_user_any_permission(g.user_id, &pairs).await.unwrap());
        assert!(!enforcer
            .check_user_any_permission(g.user_id, &pairs[..1])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_role_has_permission() {
        let g = granted().await;
        let enforcer = enforcer(&g.db, DecisionCache::disabled());

        assert!(enforcer.check_role_has_permission(g.role.id, "create-user").await.unwrap());
        assert!(!enforcer.check_role_has_permission(g.role.id, "delete-user").await.unwrap());
    }

    #[tokio::test]
    async fn test_cached_decision_is_reused_until_invalidated() {
        let g = granted().await;
        let cache = DecisionCache::new(100, std::time::Duration::from_secs(60));
        let enforcer = enforcer(&g.db, cache.clone());

        assert!(enforcer.check_user_role(g.user_id, "editor").await.unwrap());

        // Revoke behind the cache's back: the stale answer is still served
        g.db.repositories()
            .assignment_repo
            .remove_user_roles(g.user_id, &[g.role.id])
            .await
            .unwrap();
        assert!(enforcer.check_user_role(g.user_id, "editor").await.unwrap());

        cache.invalidate_all();
        assert!(!enforcer.check_user_role(g.user_id, "editor").await.unwrap());
    }

    #[tokio::test]
    async fn test_revocation_during_evaluation_is_not_cached() {
        let g = granted().await;
        let repos = g.db.repositories();
        let cache = DecisionCache::new(100, std::time::Duration::from_secs(60));
        let enforcer = enforcer(&g.db, cache.clone());
        let manager = AssignmentManager::new(&repos, RbacConfig::default(), cache.clone());

        let key = DecisionKey::UserRole {
            user_id: g.user_id,
            slug: "editor".to_string(),
        };

        // The role is revoked after the evaluation read the old grant
        let allowed = enforcer
            .decide(key.clone(), "check user role", async {
                let count = repos
                    .assignment_repo
                    .count_user_role(g.user_id, "editor")
                    .await
                    .map_err(|e| RbacError::storage("check user role", e))?;
                manager.remove_roles_from_user(g.user_id, &[g.role.id]).await?;
                Ok(count > 0)
            })
            .await
            .unwrap();
        assert!(allowed);

        assert_eq!(cache.get(&key).await, None);
        assert!(!enforcer.check_user_role(g.user_id, "editor").await.unwrap());
    }
}
