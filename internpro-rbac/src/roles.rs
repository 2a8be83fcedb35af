//! Role management

use chrono::Utc;
use internpro_storage::seaorm::repositories::{AssignmentRepository, RoleRepository};
use internpro_storage::seaorm::entities::roles;
use internpro_storage::RepositoryFactory;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    cache::DecisionCache,
    config::RbacConfig,
    error::{missing, RbacError, RbacResult},
    models::{CreateRoleRequest, Created, ListResponse, Menu, Permission, Role, UpdateRoleRequest},
    slugs,
};

/// Role manager for handling role operations
#[derive(Clone)]
pub struct RoleManager {
    roles: RoleRepository,
    assignments: AssignmentRepository,
    config: RbacConfig,
    cache: DecisionCache,
}

impl RoleManager {
    /// Create a new role manager
    pub fn new(repositories: &RepositoryFactory, config: RbacConfig, cache: DecisionCache) -> Self {
        Self {
            roles: repositories.role_repository(),
            assignments: repositories.assignment_repository(),
            config,
            cache,
        }
    }

    /// Create a role. It starts inactive unless the request says otherwise.
    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create_role(&self, request: CreateRoleRequest, actor: Uuid) -> RbacResult<Created> {
        slugs::require("name", &request.name)?;
        slugs::require("slug", &request.slug)?;
        self.validate_role_slug(&request.slug, None).await?;

        let now = Utc::now();
        let role = roles::Model {
            id: Uuid::new_v4(),
            name: request.name,
            slug: request.slug,
            description: request.description,
            is_active: request.is_active.unwrap_or(false),
            created_at: now,
            created_by: Some(actor),
            updated_at: now,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        };

        let role = self
            .roles
            .create(role)
            .await
            .map_err(|e| RbacError::storage("create role", e))?;
        self.cache.invalidate_all();

        info!(role_id = %role.id, slug = %role.slug, %actor, "Role created");
        Ok(Created {
            id: role.id,
            message: "Role created successfully".to_string(),
        })
    }

    /// Get a live role
    pub async fn get_role(&self, id: Uuid) -> RbacResult<Role> {
        self.find_role(id).await.map(Role::from)
    }

    /// Get a role even if it has been soft-deleted, for audit views
    pub async fn get_role_including_deleted(&self, id: Uuid) -> RbacResult<Role> {
        self.roles
            .find_by_id_including_deleted(id)
            .await
            .map_err(|e| RbacError::storage("get role", e))?
            .map(Role::from)
            .ok_or_else(|| missing("Role", id))
    }

    /// List live roles, newest first
    pub async fn list_roles(
        &self,
        page: u64,
        limit: u64,
        search: Option<&str>,
    ) -> RbacResult<ListResponse<Role>> {
        let query = self.config.list_query(page, limit, search);
        let page = self
            .roles
            .list(&query)
            .await
            .map_err(|e| RbacError::storage("list roles", e))?;

        debug!(total = page.total, page = query.page, "Listed roles");
        Ok(ListResponse {
            data: page.items.into_iter().map(Role::from).collect(),
            meta: self.config.pagination_meta(&query, page.total),
        })
    }

    /// Apply the fields present in `request`
    #[instrument(skip(self, request))]
    pub async fn update_role(
        &self,
        id: Uuid,
        request: UpdateRoleRequest,
        actor: Uuid,
    ) -> RbacResult<Role> {
        let mut role = self.find_role(id).await?;

        if let Some(name) = request.name {
            slugs::require("name", &name)?;
            role.name = name;
        }
        if let Some(slug) = request.slug {
            slugs::require("slug", &slug)?;
            self.validate_role_slug(&slug, Some(id)).await?;
            role.slug = slug;
        }
        if let Some(description) = request.description {
            role.description = description;
        }
        if let Some(is_active) = request.is_active {
            role.is_active = is_active;
        }
        role.updated_at = Utc::now();
        role.updated_by = Some(actor);

        let role = self
            .roles
            .update(role)
            .await
            .map_err(|e| RbacError::storage("update role", e))?;
        self.cache.invalidate_all();

        info!(role_id = %id, %actor, "Role updated");
        Ok(role.into())
    }

    /// Soft-delete a role
    #[instrument(skip(self))]
    pub async fn delete_role(&self, id: Uuid, actor: Uuid) -> RbacResult<()> {
        let deleted = self
            .roles
            .soft_delete(id, Some(actor))
            .await
            .map_err(|e| RbacError::storage("delete role", e))?;
        if !deleted {
            return Err(missing("Role", id));
        }
        self.cache.invalidate_all();

        info!(role_id = %id, %actor, "Role deleted");
        Ok(())
    }

    /// Role with its active permissions
    pub async fn get_role_with_permissions(&self, id: Uuid) -> RbacResult<Role> {
        let role = self.find_role(id).await?;
        let permissions = self
            .assignments
            .find_role_permissions(id)
            .await
            .map_err(|e| RbacError::storage("get role permissions", e))?;

        let mut role = Role::from(role);
        role.permissions = permissions.into_iter().map(Permission::from).collect();
        Ok(role)
    }

    /// Role with the active menus it has been granted
    pub async fn get_role_with_menus(&self, id: Uuid) -> RbacResult<Role> {
        let role = self.find_role(id).await?;
        let grants = self
            .assignments
            .find_role_menus(id)
            .await
            .map_err(|e| RbacError::storage("get role menus", e))?;

        let mut role = Role::from(role);
        role.menus = grants.into_iter().map(|(_, menu)| Menu::from(menu)).collect();
        Ok(role)
    }

    /// Fail with a conflict if a live role other than `exclude_id` uses `slug`
    pub async fn validate_role_slug(&self, slug: &str, exclude_id: Option<Uuid>) -> RbacResult<()> {
        let holder = self
            .roles
            .find_by_slug(slug)
            .await
            .map_err(|e| RbacError::storage("check role slug", e))?;
        slugs::ensure_available("role", slug, holder.map(|role| role.id), exclude_id)
    }

    /// Live role by slug, if any
    pub async fn find_role_by_slug(&self, slug: &str) -> RbacResult<Option<Role>> {
        let role = self
            .roles
            .find_by_slug(slug)
            .await
            .map_err(|e| RbacError::storage("get role", e))?;
        Ok(role.map(Role::from))
    }

    async fn find_role(&self, id: Uuid) -> RbacResult<roles::Model> {
        self.roles
            .find_by_id(id)
            .await
            .map_err(|e| RbacError::storage("get role", e))?
            .ok_or_else(|| missing("Role", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use internpro_storage::seaorm::repositories::MenuGrant;
    use internpro_storage::testing::{fixtures, TestDatabase};

    async fn setup() -> (TestDatabase, RoleManager) {
        let db = TestDatabase::new_in_memory().await.unwrap();
        let manager = RoleManager::new(&db.repositories(), RbacConfig::default(), DecisionCache::disabled());
        (db, manager)
    }

    fn request(slug: &str) -> CreateRoleRequest {
        CreateRoleRequest {
            name: format!("Role {}", slug),
            slug: slug.to_string(),
            description: String::new(),
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_create_role_defaults_to_inactive() {
        let (_db, manager) = setup().await;
        let actor = Uuid::new_v4();

        let created = manager.create_role(request("editor"), actor).await.unwrap();
        assert_eq!(created.message, "Role created successfully");

        let role = manager.get_role(created.id).await.unwrap();
        assert!(!role.is_active);
        assert_eq!(role.lifecycle.created_by, Some(actor));
        assert_eq!(role.slug, "editor");
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let (_db, manager) = setup().await;
        let actor = Uuid::new_v4();

        manager.create_role(request("editor"), actor).await.unwrap();
        let err = manager.create_role(request("editor"), actor).await.unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "role slug already exists");
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let (_db, manager) = setup().await;
        let mut blank = request("editor");
        blank.name = " ".to_string();

        let err = manager.create_role(blank, Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_update_applies_only_present_fields() {
        let (_db, manager) = setup().await;
        let actor = Uuid::new_v4();
        let created = manager.create_role(request("editor"), actor).await.unwrap();

        let updated = manager
            .update_role(
                created.id,
                UpdateRoleRequest {
                    description: Some("Edits content".to_string()),
                    is_active: Some(true),
                    ..Default::default()
                },
                actor,
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Role editor");
        assert_eq!(updated.description, "Edits content");
        assert!(updated.is_active);
        assert_eq!(updated.lifecycle.updated_by, Some(actor));
    }

    #[tokio::test]
    async fn test_update_slug_checks_other_roles_only() {
        let (_db, manager) = setup().await;
        let actor = Uuid::new_v4();
        let editor = manager.create_role(request("editor"), actor).await.unwrap();
        manager.create_role(request("viewer"), actor).await.unwrap();

        // Keeping its own slug is fine
        manager
            .update_role(
                editor.id,
                UpdateRoleRequest {
                    slug: Some("editor".to_string()),
                    ..Default::default()
                },
                actor,
            )
            .await
            .unwrap();

        let err = manager
            .update_role(
                editor.id,
                UpdateRoleRequest {
                    slug: Some("viewer".to_string()),
                    ..Default::default()
                },
                actor,
            )
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_delete_hides_role_and_frees_slug() {
        let (_db, manager) = setup().await;
        let actor = Uuid::new_v4();
        let created = manager.create_role(request("editor"), actor).await.unwrap();

        manager.delete_role(created.id, actor).await.unwrap();

        assert!(manager.get_role(created.id).await.unwrap_err().is_not_found());
        assert!(manager.delete_role(created.id, actor).await.unwrap_err().is_not_found());

        let audit = manager.get_role_including_deleted(created.id).await.unwrap();
        assert!(audit.lifecycle.is_deleted());
        assert_eq!(audit.lifecycle.deleted_by, Some(actor));

        let reused = manager.create_role(request("editor"), actor).await.unwrap();
        assert_ne!(reused.id, created.id);
    }

    #[tokio::test]
    async fn test_update_missing_role() {
        let (_db, manager) = setup().await;
        let err = manager
            .update_role(Uuid::new_v4(), UpdateRoleRequest::default(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_roles_paginates_and_searches() {
        let (_db, manager) = setup().await;
        let actor = Uuid::new_v4();
        for slug in ["admin", "editor", "viewer"] {
            manager.create_role(request(slug), actor).await.unwrap();
        }

        let page = manager.list_roles(1, 2, None).await.unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.meta.total_items, 3);
        assert_eq!(page.meta.total_pages, 2);

        let found = manager.list_roles(0, 0, Some("EDIT")).await.unwrap();
        assert_eq!(found.meta.page, 1);
        assert_eq!(found.meta.limit, 10);
        assert_eq!(found.data.len(), 1);
        assert_eq!(found.data[0].slug, "editor");
    }

    #[tokio::test]
    async fn test_role_with_permissions_and_menus() {
        let (db, manager) = setup().await;
        let repos = db.repositories();

        let role = repos.role_repo.create(fixtures::role("admin")).await.unwrap();
        let read = repos
            .permission_repo
            .create(fixtures::permission("read-user", "users", "read"))
            .await
            .unwrap();
        let mut disabled = fixtures::permission("delete-user", "users", "delete");
        disabled.is_active = false;
        let disabled = repos.permission_repo.create(disabled).await.unwrap();
        let dashboard = repos
            .menu_repo
            .create(fixtures::menu("dashboard", None, 1))
            .await
            .unwrap();

        repos
            .assignment_repo
            .replace_role_permissions(role.id, &[read.id, disabled.id], None)
            .await
            .unwrap();
        repos
            .assignment_repo
            .replace_role_menus(
                role.id,
                &[MenuGrant {
                    menu_id: dashboard.id,
                    can_view: true,
                    can_create: false,
                    can_edit: false,
                    can_delete: false,
                }],
                None,
            )
            .await
            .unwrap();

        let with_permissions = manager.get_role_with_permissions(role.id).await.unwrap();
        assert_eq!(with_permissions.permissions.len(), 1);
        assert_eq!(with_permissions.permissions[0].slug, "read-user");

        let with_menus = manager.get_role_with_menus(role.id).await.unwrap();
        assert_eq!(with_menus.menus.len(), 1);
        assert_eq!(with_menus.menus[0].slug, "dashboard");
    }
}
