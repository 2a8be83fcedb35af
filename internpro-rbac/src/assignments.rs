//! Assignment protocols for the three junction relations
//!
//! Assigning always replaces the complete set held by the role or user, in
//! one transaction, after every referenced id has been resolved. Removing
//! only deletes the listed ids.

use chrono::Utc;
use internpro_storage::seaorm::repositories::{
    AssignmentRepository, MenuGrant, MenuRepository, PermissionRepository, RoleRepository,
};
use internpro_storage::RepositoryFactory;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    cache::DecisionCache,
    config::RbacConfig,
    deadline::bounded,
    error::{missing, RbacError, RbacResult},
    models::{
        ListResponse, MenuPermissionRequest, Permission, RoleMember, UpdateRoleMenuRequest,
        UserRoleAssignment,
    },
};

/// Manages role permissions, role menus and user roles
#[derive(Clone)]
pub struct AssignmentManager {
    roles: RoleRepository,
    permissions: PermissionRepository,
    menus: MenuRepository,
    assignments: AssignmentRepository,
    config: RbacConfig,
    cache: DecisionCache,
}

impl AssignmentManager {
    pub fn new(repositories: &RepositoryFactory, config: RbacConfig, cache: DecisionCache) -> Self {
        Self {
            roles: repositories.role_repository(),
            permissions: repositories.permission_repository(),
            menus: repositories.menu_repository(),
            assignments: repositories.assignment_repository(),
            config,
            cache,
        }
    }

    /// Replace the permission set of a role
    #[instrument(skip(self, permission_ids), fields(count = permission_ids.len()))]
    pub async fn assign_permissions_to_role(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
        actor: Uuid,
    ) -> RbacResult<()> {
        self.mutate("assign permissions to role", async {
            self.ensure_role_exists(role_id).await?;
            ensure_distinct(permission_ids, "permission")?;

            let found = self
                .permissions
                .find_by_ids(permission_ids)
                .await
                .map_err(|e| RbacError::storage("get permissions", e))?;
            if found.len() != permission_ids.len() {
                warn!(%role_id, requested = permission_ids.len(), found = found.len(), "Unknown permissions in assignment");
                return Err(RbacError::validation("some permissions not found"));
            }

            self.assignments
                .replace_role_permissions(role_id, permission_ids, Some(actor))
                .await
                .map_err(|e| RbacError::storage("assign permissions to role", e))?;

            info!(%role_id, count = permission_ids.len(), %actor, "Permissions assigned to role");
            Ok(())
        })
        .await
    }

    /// Revoke the listed permissions from a role. Returns how many grants were removed.
    #[instrument(skip(self, permission_ids))]
    pub async fn remove_permissions_from_role(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> RbacResult<u64> {
        self.mutate("remove permissions from role", async {
            let removed = self
                .assignments
                .remove_role_permissions(role_id, permission_ids)
                .await
                .map_err(|e| RbacError::storage("remove permissions from role", e))?;

            info!(%role_id, removed, "Permissions removed from role");
            Ok(removed)
        })
        .await
    }

    /// Replace the menu grants of a role. Every menu is resolved before
    /// anything is deleted.
    #[instrument(skip(self, menu_permissions), fields(count = menu_permissions.len()))]
    pub async fn assign_menus_to_role(
        &self,
        role_id: Uuid,
        menu_permissions: &[MenuPermissionRequest],
        actor: Uuid,
    ) -> RbacResult<()> {
        self.mutate("assign menus to role", async {
            self.ensure_role_exists(role_id).await?;

            let menu_ids: Vec<Uuid> = menu_permissions.iter().map(|entry| entry.menu_id).collect();
            ensure_distinct(&menu_ids, "menu")?;

            let found = self
                .menus
                .find_by_ids(&menu_ids)
                .await
                .map_err(|e| RbacError::storage("get menus", e))?;
            if found.len() != menu_ids.len() {
                warn!(%role_id, requested = menu_ids.len(), found = found.len(), "Unknown menus in assignment");
                return Err(RbacError::validation("some menus not found"));
            }

            let grants: Vec<MenuGrant> = menu_permissions.iter().copied().map(MenuGrant::from).collect();
            self.assignments
                .replace_role_menus(role_id, &grants, Some(actor))
                .await
                .map_err(|e| RbacError::storage("assign menus to role", e))?;

            info!(%role_id, count = grants.len(), %actor, "Menus assigned to role");
            Ok(())
        })
        .await
    }

    /// Revoke the listed menus from a role. Returns how many grants were removed.
    #[instrument(skip(self, menu_ids))]
    pub async fn remove_menus_from_role(&self, role_id: Uuid, menu_ids: &[Uuid]) -> RbacResult<u64> {
        self.mutate("remove menus from role", async {
            let removed = self
                .assignments
                .remove_role_menus(role_id, menu_ids)
                .await
                .map_err(|e| RbacError::storage("remove menus from role", e))?;

            info!(%role_id, removed, "Menus removed from role");
            Ok(removed)
        })
        .await
    }

    /// Change the flags of one existing menu grant
    #[instrument(skip(self, request))]
    pub async fn update_role_menu_permissions(
        &self,
        role_menu_id: Uuid,
        request: UpdateRoleMenuRequest,
        actor: Uuid,
    ) -> RbacResult<()> {
        self.mutate("update role menu permissions", async {
            let mut grant = self
                .assignments
                .find_role_menu(role_menu_id)
                .await
                .map_err(|e| RbacError::storage("get role menu", e))?
                .ok_or_else(|| missing("Role menu", role_menu_id))?;

            if let Some(can_view) = request.can_view {
                grant.can_view = can_view;
            }
            if let Some(can_create) = request.can_create {
                grant.can_create = can_create;
            }
            if let Some(can_edit) = request.can_edit {
                grant.can_edit = can_edit;
            }
            if let Some(can_delete) = request.can_delete {
                grant.can_delete = can_delete;
            }
            grant.updated_at = Utc::now();
            grant.updated_by = Some(actor);

            self.assignments
                .update_role_menu(grant)
                .await
                .map_err(|e| RbacError::storage("update role menu permissions", e))?;

            info!(%role_menu_id, %actor, "Role menu permissions updated");
            Ok(())
        })
        .await
    }

    /// Replace the complete role set of a user
    #[instrument(skip(self, role_ids), fields(count = role_ids.len()))]
    pub async fn assign_roles_to_user(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
        actor: Uuid,
    ) -> RbacResult<()> {
        self.mutate("assign roles to user", async {
            ensure_distinct(role_ids, "role")?;

            let found = self
                .roles
                .find_by_ids(role_ids)
                .await
                .map_err(|e| RbacError::storage("get roles", e))?;
            if found.len() != role_ids.len() {
                warn!(%user_id, requested = role_ids.len(), found = found.len(), "Unknown roles in assignment");
                return Err(RbacError::validation("some roles not found"));
            }

            self.assignments
                .replace_user_roles(user_id, role_ids, Some(actor))
                .await
                .map_err(|e| RbacError::storage("assign roles to user", e))?;

            info!(%user_id, count = role_ids.len(), %actor, "Roles assigned to user");
            Ok(())
        })
        .await
    }

    /// Revoke only the listed roles from a user. Returns how many were removed.
    #[instrument(skip(self, role_ids))]
    pub async fn remove_roles_from_user(&self, user_id: Uuid, role_ids: &[Uuid]) -> RbacResult<u64> {
        self.mutate("remove roles from user", async {
            let removed = self
                .assignments
                .remove_user_roles(user_id, role_ids)
                .await
                .map_err(|e| RbacError::storage("remove roles from user", e))?;

            info!(%user_id, removed, "Roles removed from user");
            Ok(removed)
        })
        .await
    }

    /// Give a user one more role without touching the others.
    /// Returns false if the user already held it.
    pub async fn add_role_to_user(&self, user_id: Uuid, role_id: Uuid, actor: Uuid) -> RbacResult<bool> {
        self.ensure_role_exists(role_id).await?;

        let added = self
            .assignments
            .add_user_role(user_id, role_id, Some(actor))
            .await
            .map_err(|e| RbacError::storage("add role to user", e))?;
        if added {
            self.cache.invalidate_all();
            info!(%user_id, %role_id, %actor, "Role added to user");
        }
        Ok(added)
    }

    /// Roles held by a user, with their role records
    pub async fn get_user_roles(&self, user_id: Uuid) -> RbacResult<Vec<UserRoleAssignment>> {
        let rows = self
            .assignments
            .find_user_roles(user_id)
            .await
            .map_err(|e| RbacError::storage("get user roles", e))?;

        debug!(%user_id, count = rows.len(), "Loaded user roles");
        Ok(rows.into_iter().map(UserRoleAssignment::from).collect())
    }

    /// Users holding a role, most recent assignment first
    pub async fn get_users_by_role(
        &self,
        role_id: Uuid,
        page: u64,
        limit: u64,
    ) -> RbacResult<ListResponse<RoleMember>> {
        self.ensure_role_exists(role_id).await?;

        let query = self.config.list_query(page, limit, None);
        let page = self
            .assignments
            .find_users_by_role(role_id, &query)
            .await
            .map_err(|e| RbacError::storage("get users by role", e))?;

        Ok(ListResponse {
            data: page.items.into_iter().map(RoleMember::from).collect(),
            meta: self.config.pagination_meta(&query, page.total),
        })
    }

    /// Distinct active permissions the user holds through active roles
    pub async fn get_user_permissions(&self, user_id: Uuid) -> RbacResult<Vec<Permission>> {
        let permissions = self
            .assignments
            .find_user_permissions(user_id)
            .await
            .map_err(|e| RbacError::storage("get user permissions", e))?;
        Ok(permissions.into_iter().map(Permission::from).collect())
    }

    /// Run a write under the configured deadline. The decision cache is
    /// cleared whatever the outcome: a write that failed or timed out after
    /// its commit was issued may still have landed.
    async fn mutate<T, F>(&self, operation: &'static str, write: F) -> RbacResult<T>
    where
        F: std::future::Future<Output = RbacResult<T>>,
    {
        let result = bounded(self.config.operation_timeout, operation, write).await;
        self.cache.invalidate_all();
        result
    }

    async fn ensure_role_exists(&self, role_id: Uuid) -> RbacResult<()> {
        let role = self
            .roles
            .find_by_id(role_id)
            .await
            .map_err(|e| RbacError::storage("get role", e))?;
        match role {
            Some(_) => Ok(()),
            None => Err(missing("Role", role_id)),
        }
    }
}

/// Reject an id list that names the same record twice
fn ensure_distinct(ids: &[Uuid], entity: &'static str) -> RbacResult<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    match ids.iter().find(|id| !seen.insert(**id)) {
        Some(duplicate) => Err(RbacError::validation(format!(
            "duplicate {} id {}",
            entity, duplicate
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use internpro_storage::seaorm::entities::{menus, permissions, roles};
    use internpro_storage::testing::{fixtures, TestDatabase};

    struct Fixture {
        db: TestDatabase,
        manager: AssignmentManager,
        actor: Uuid,
    }

    impl Fixture {
        async fn new() -> Self {
            let db = TestDatabase::new_in_memory().await.unwrap();
            let manager =
                AssignmentManager::new(&db.repositories(), RbacConfig::default(), DecisionCache::disabled());
            Self {
                db,
                manager,
                actor: Uuid::new_v4(),
            }
        }

        async fn role(&self, slug: &str) -> roles::Model {
            self.db.repositories().role_repo.create(fixtures::role(slug)).await.unwrap()
        }

        async fn permission(&self, slug: &str, action: &str) -> permissions::Model {
            self.db
                .repositories()
                .permission_repo
                .create(fixtures::permission(slug, "users", action))
                .await
                .unwrap()
        }

        async fn menu(&self, slug: &str, sort_order: i32) -> menus::Model {
            self.db
                .repositories()
                .menu_repo
                .create(fixtures::menu(slug, None, sort_order))
                .await
                .unwrap()
        }
    }

    #[test]
    fn test_ensure_distinct() {
        let id = Uuid::new_v4();
        assert!(ensure_distinct(&[id, Uuid::new_v4()], "role").is_ok());
        assert!(ensure_distinct(&[id, id], "role").unwrap_err().is_validation());
        assert!(ensure_distinct(&[], "role").is_ok());
    }

    #[tokio::test]
    async fn test_assign_permissions_replaces_previous_set() {
        let fx = Fixture::new().await;
        let role = fx.role("editor").await;
        let create = fx.permission("create-user", "create").await;
        let read = fx.permission("read-user", "read").await;
        let delete = fx.permission("delete-user", "delete").await;

        fx.manager
            .assign_permissions_to_role(role.id, &[create.id, read.id], fx.actor)
            .await
            .unwrap();
        fx.manager
            .assign_permissions_to_role(role.id, &[delete.id], fx.actor)
            .await
            .unwrap();

        let granted = fx
            .db
            .repositories()
            .assignment_repo
            .find_role_permissions(role.id)
            .await
            .unwrap();
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].id, delete.id);
    }

    #[tokio::test]
    async fn test_assign_permissions_rejects_unknown_ids_without_changes() {
        let fx = Fixture::new().await;
        let role = fx.role("editor").await;
        let read = fx.permission("read-user", "read").await;
        fx.manager
            .assign_permissions_to_role(role.id, &[read.id], fx.actor)
            .await
            .unwrap();

        let err = fx
            .manager
            .assign_permissions_to_role(role.id, &[Uuid::new_v4()], fx.actor)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let granted = fx
            .db
            .repositories()
            .assignment_repo
            .find_role_permissions(role.id)
            .await
            .unwrap();
        assert_eq!(granted.len(), 1);
    }

    #[tokio::test]
    async fn test_assign_to_missing_role() {
        let fx = Fixture::new().await;
        let err = fx
            .manager
            .assign_permissions_to_role(Uuid::new_v4(), &[], fx.actor)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_deleted_permission_cannot_be_assigned() {
        let fx = Fixture::new().await;
        let role = fx.role("editor").await;
        let read = fx.permission("read-user", "read").await;
        fx.db
            .repositories()
            .permission_repo
            .soft_delete(read.id, None)
            .await
            .unwrap();

        let err = fx
            .manager
            .assign_permissions_to_role(role.id, &[read.id], fx.actor)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_rejected() {
        let fx = Fixture::new().await;
        let role = fx.role("editor").await;
        let read = fx.permission("read-user", "read").await;

        let err = fx
            .manager
            .assign_permissions_to_role(role.id, &[read.id, read.id], fx.actor)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_remove_permissions_is_targeted() {
        let fx = Fixture::new().await;
        let role = fx.role("editor").await;
        let create = fx.permission("create-user", "create").await;
        let read = fx.permission("read-user", "read").await;
        fx.manager
            .assign_permissions_to_role(role.id, &[create.id, read.id], fx.actor)
            .await
            .unwrap();

        let removed = fx
            .manager
            .remove_permissions_from_role(role.id, &[create.id])
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let granted = fx
            .db
            .repositories()
            .assignment_repo
            .find_role_permissions(role.id)
            .await
            .unwrap();
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].id, read.id);
    }

    #[tokio::test]
    async fn test_assign_menus_and_update_flags() {
        let fx = Fixture::new().await;
        let role = fx.role("editor").await;
        let dashboard = fx.menu("dashboard", 1).await;
        let users = fx.menu("users", 2).await;

        fx.manager
            .assign_menus_to_role(
                role.id,
                &[MenuPermissionRequest::view(dashboard.id), MenuPermissionRequest::full(users.id)],
                fx.actor,
            )
            .await
            .unwrap();

        let grants = fx
            .db
            .repositories()
            .assignment_repo
            .find_role_menus(role.id)
            .await
            .unwrap();
        assert_eq!(grants.len(), 2);
        let (dashboard_grant, _) = &grants[0];
        assert!(dashboard_grant.can_view && !dashboard_grant.can_edit);

        fx.manager
            .update_role_menu_permissions(
                dashboard_grant.id,
                UpdateRoleMenuRequest {
                    can_edit: Some(true),
                    ..Default::default()
                },
                fx.actor,
            )
            .await
            .unwrap();

        let updated = fx
            .db
            .repositories()
            .assignment_repo
            .find_role_menu(dashboard_grant.id)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.can_view && updated.can_edit && !updated.can_delete);
        assert_eq!(updated.updated_by, Some(fx.actor));

        let removed = fx.manager.remove_menus_from_role(role.id, &[users.id]).await.unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_unknown_menu_grant() {
        let fx = Fixture::new().await;
        let err = fx
            .manager
            .update_role_menu_permissions(Uuid::new_v4(), UpdateRoleMenuRequest::default(), fx.actor)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_assign_menus_rejects_unknown_menu() {
        let fx = Fixture::new().await;
        let role = fx.role("editor").await;
        let dashboard = fx.menu("dashboard", 1).await;

        let err = fx
            .manager
            .assign_menus_to_role(
                role.id,
                &[MenuPermissionRequest::view(dashboard.id), MenuPermissionRequest::view(Uuid::new_v4())],
                fx.actor,
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_user_roles_replace_then_remove() {
        let fx = Fixture::new().await;
        let user_id = Uuid::new_v4();
        let editor = fx.role("editor").await;
        let viewer = fx.role("viewer").await;
        let auditor = fx.role("auditor").await;

        fx.manager
            .assign_roles_to_user(user_id, &[editor.id, viewer.id], fx.actor)
            .await
            .unwrap();
        fx.manager
            .assign_roles_to_user(user_id, &[viewer.id, auditor.id], fx.actor)
            .await
            .unwrap();

        let mut slugs: Vec<String> = fx
            .manager
            .get_user_roles(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|assignment| assignment.role.slug)
            .collect();
        slugs.sort();
        assert_eq!(slugs, vec!["auditor", "viewer"]);

        let removed = fx.manager.remove_roles_from_user(user_id, &[viewer.id]).await.unwrap();
        assert_eq!(removed, 1);

        let remaining = fx.manager.get_user_roles(user_id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].role_id, auditor.id);
        assert_eq!(remaining[0].assigned_by, Some(fx.actor));
    }

    #[tokio::test]
    async fn test_assign_unknown_role_to_user() {
        let fx = Fixture::new().await;
        let err = fx
            .manager
            .assign_roles_to_user(Uuid::new_v4(), &[Uuid::new_v4()], fx.actor)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_add_role_is_additive_and_idempotent() {
        let fx = Fixture::new().await;
        let user_id = Uuid::new_v4();
        let editor = fx.role("editor").await;
        let viewer = fx.role("viewer").await;
        fx.manager
            .assign_roles_to_user(user_id, &[editor.id], fx.actor)
            .await
            .unwrap();

        assert!(fx.manager.add_role_to_user(user_id, viewer.id, fx.actor).await.unwrap());
        assert!(!fx.manager.add_role_to_user(user_id, viewer.id, fx.actor).await.unwrap());
        assert_eq!(fx.manager.get_user_roles(user_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_users_by_role_and_user_permissions() {
        let fx = Fixture::new().await;
        let editor = fx.role("editor").await;
        let read = fx.permission("read-user", "read").await;
        fx.manager
            .assign_permissions_to_role(editor.id, &[read.id], fx.actor)
            .await
            .unwrap();

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        for user_id in [first, second] {
            fx.manager
                .assign_roles_to_user(user_id, &[editor.id], fx.actor)
                .await
                .unwrap();
        }

        let members = fx.manager.get_users_by_role(editor.id, 1, 10).await.unwrap();
        assert_eq!(members.meta.total_items, 2);

        let permissions = fx.manager.get_user_permissions(first).await.unwrap();
        assert_eq!(permissions.len(), 1);
        assert_eq!(permissions[0].slug, "read-user");

        let err = fx.manager.get_users_by_role(Uuid::new_v4(), 1, 10).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_write_still_clears_cache() {
        let fx = Fixture::new().await;
        let cache = DecisionCache::new(100, std::time::Duration::from_secs(60));
        let manager = AssignmentManager::new(&fx.db.repositories(), RbacConfig::default(), cache.clone());
        let user_id = Uuid::new_v4();

        let key = crate::cache::DecisionKey::UserRole {
            user_id,
            slug: "editor".to_string(),
        };
        assert!(cache.insert(key.clone(), true, cache.generation()).await);

        let err = manager
            .assign_roles_to_user(user_id, &[Uuid::new_v4()], fx.actor)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(cache.get(&key).await, None);
    }
}
