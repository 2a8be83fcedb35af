//! Permission management

use chrono::Utc;
use internpro_storage::seaorm::entities::permissions;
use internpro_storage::seaorm::repositories::PermissionRepository;
use internpro_storage::RepositoryFactory;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    cache::DecisionCache,
    config::RbacConfig,
    error::{missing, RbacError, RbacResult},
    models::{CreatePermissionRequest, Created, ListResponse, Permission, UpdatePermissionRequest},
    slugs,
};

/// Permission manager for handling permission operations
#[derive(Clone)]
pub struct PermissionManager {
    permissions: PermissionRepository,
    config: RbacConfig,
    cache: DecisionCache,
}

impl PermissionManager {
    /// Create a new permission manager
    pub fn new(repositories: &RepositoryFactory, config: RbacConfig, cache: DecisionCache) -> Self {
        Self {
            permissions: repositories.permission_repository(),
            config,
            cache,
        }
    }

    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create_permission(
        &self,
        request: CreatePermissionRequest,
        actor: Uuid,
    ) -> RbacResult<Created> {
        slugs::require("name", &request.name)?;
        slugs::require("slug", &request.slug)?;
        slugs::require("resource", &request.resource)?;
        slugs::require("action", &request.action)?;
        self.validate_permission_slug(&request.slug, None).await?;

        let now = Utc::now();
        let permission = permissions::Model {
            id: Uuid::new_v4(),
            name: request.name,
            slug: request.slug,
            resource: request.resource,
            action: request.action,
            description: request.description,
            is_active: request.is_active.unwrap_or(false),
            created_at: now,
            created_by: Some(actor),
            updated_at: now,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        };

        let permission = self
            .permissions
            .create(permission)
            .await
            .map_err(|e| RbacError::storage("create permission", e))?;
        self.cache.invalidate_all();

        info!(
            permission_id = %permission.id,
            resource = %permission.resource,
            action = %permission.action,
            %actor,
            "Permission created"
        );
        Ok(Created {
            id: permission.id,
            message: "Permission created successfully".to_string(),
        })
    }

    pub async fn get_permission(&self, id: Uuid) -> RbacResult<Permission> {
        self.find_permission(id).await.map(Permission::from)
    }

    /// Get a permission even if it has been soft-deleted
    pub async fn get_permission_including_deleted(&self, id: Uuid) -> RbacResult<Permission> {
        self.permissions
            .find_by_id_including_deleted(id)
            .await
            .map_err(|e| RbacError::storage("get permission", e))?
            .map(Permission::from)
            .ok_or_else(|| missing("Permission", id))
    }

    /// List live permissions ordered by resource and action
    pub async fn list_permissions(
        &self,
        page: u64,
        limit: u64,
        search: Option<&str>,
    ) -> RbacResult<ListResponse<Permission>> {
        let query = self.config.list_query(page, limit, search);
        let page = self
            .permissions
            .list(&query)
            .await
            .map_err(|e| RbacError::storage("list permissions", e))?;

        debug!(total = page.total, page = query.page, "Listed permissions");
        Ok(ListResponse {
            data: page.items.into_iter().map(Permission::from).collect(),
            meta: self.config.pagination_meta(&query, page.total),
        })
    }

    /// All live permissions on one resource, ordered by action
    pub async fn get_permissions_by_resource(&self, resource: &str) -> RbacResult<Vec<Permission>> {
        let permissions = self
            .permissions
            .find_by_resource(resource)
            .await
            .map_err(|e| RbacError::storage("get permissions by resource", e))?;
        Ok(permissions.into_iter().map(Permission::from).collect())
    }

    #[instrument(skip(self, request))]
    pub async fn update_permission(
        &self,
        id: Uuid,
        request: UpdatePermissionRequest,
        actor: Uuid,
    ) -> RbacResult<Permission> {
        let mut permission = self.find_permission(id).await?;

        if let Some(name) = request.name {
            slugs::require("name", &name)?;
            permission.name = name;
        }
        if let Some(slug) = request.slug {
            slugs::require("slug", &slug)?;
            self.validate_permission_slug(&slug, Some(id)).await?;
            permission.slug = slug;
        }
        if let Some(resource) = request.resource {
            slugs::require("resource", &resource)?;
            permission.resource = resource;
        }
        if let Some(action) = request.action {
            slugs::require("action", &action)?;
            permission.action = action;
        }
        if let Some(description) = request.description {
            permission.description = description;
        }
        if let Some(is_active) = request.is_active {
            permission.is_active = is_active;
        }
        permission.updated_at = Utc::now();
        permission.updated_by = Some(actor);

        let permission = self
            .permissions
            .update(permission)
            .await
            .map_err(|e| RbacError::storage("update permission", e))?;
        self.cache.invalidate_all();

        info!(permission_id = %id, %actor, "Permission updated");
        Ok(permission.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_permission(&self, id: Uuid, actor: Uuid) -> RbacResult<()> {
        let deleted = self
            .permissions
            .soft_delete(id, Some(actor))
            .await
            .map_err(|e| RbacError::storage("delete permission", e))?;
        if !deleted {
            return Err(missing("Permission", id));
        }
        self.cache.invalidate_all();

        info!(permission_id = %id, %actor, "Permission deleted");
        Ok(())
    }

    /// Fail with a conflict if a live permission other than `exclude_id` uses `slug`
    pub async fn validate_permission_slug(
        &self,
        slug: &str,
        exclude_id: Option<Uuid>,
    ) -> RbacResult<()> {
        let holder = self
            .permissions
            .find_by_slug(slug)
            .await
            .map_err(|e| RbacError::storage("check permission slug", e))?;
        slugs::ensure_available("permission", slug, holder.map(|p| p.id), exclude_id)
    }

    /// Live permission by slug, if any
    pub async fn find_permission_by_slug(&self, slug: &str) -> RbacResult<Option<Permission>> {
        let permission = self
            .permissions
            .find_by_slug(slug)
            .await
            .map_err(|e| RbacError::storage("get permission", e))?;
        Ok(permission.map(Permission::from))
    }

    async fn find_permission(&self, id: Uuid) -> RbacResult<permissions::Model> {
        self.permissions
            .find_by_id(id)
            .await
            .map_err(|e| RbacError::storage("get permission", e))?
            .ok_or_else(|| missing("Permission", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use internpro_storage::testing::TestDatabase;

    async fn setup() -> (TestDatabase, PermissionManager) {
        let db = TestDatabase::new_in_memory().await.unwrap();
        let manager =
            PermissionManager::new(&db.repositories(), RbacConfig::default(), DecisionCache::disabled());
        (db, manager)
    }

    fn request(slug: &str, resource: &str, action: &str) -> CreatePermissionRequest {
        CreatePermissionRequest {
            name: format!("Permission {}", slug),
            slug: slug.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            description: String::new(),
            is_active: Some(true),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_db, manager) = setup().await;
        let created = manager
            .create_permission(request("create-user", "users", "create"), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(created.message, "Permission created successfully");

        let permission = manager.get_permission(created.id).await.unwrap();
        assert_eq!(permission.resource, "users");
        assert_eq!(permission.action, "create");
        assert!(permission.is_active);
    }

    #[tokio::test]
    async fn test_slug_reuse_after_delete() {
        let (_db, manager) = setup().await;
        let actor = Uuid::new_v4();
        let first = manager
            .create_permission(request("create-user", "users", "create"), actor)
            .await
            .unwrap();

        let err = manager
            .create_permission(request("create-user", "users", "create"), actor)
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        manager.delete_permission(first.id, actor).await.unwrap();
        manager
            .create_permission(request("create-user", "users", "create"), actor)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_resource_listing_orders_by_action() {
        let (_db, manager) = setup().await;
        let actor = Uuid::new_v4();
        for (slug, action) in [("update-user", "update"), ("create-user", "create"), ("read-user", "read")] {
            manager
                .create_permission(request(slug, "users", action), actor)
                .await
                .unwrap();
        }
        manager
            .create_permission(request("manage-roles", "roles", "manage"), actor)
            .await
            .unwrap();

        let actions: Vec<String> = manager
            .get_permissions_by_resource("users")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.action)
            .collect();
        assert_eq!(actions, vec!["create", "read", "update"]);
    }

    #[tokio::test]
    async fn test_list_search_matches_resource() {
        let (_db, manager) = setup().await;
        let actor = Uuid::new_v4();
        manager
            .create_permission(request("create-user", "users", "create"), actor)
            .await
            .unwrap();
        manager
            .create_permission(request("manage-roles", "roles", "manage"), actor)
            .await
            .unwrap();

        let found = manager.list_permissions(1, 10, Some("roles")).await.unwrap();
        assert_eq!(found.meta.total_items, 1);
        assert_eq!(found.data[0].slug, "manage-roles");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let (_db, manager) = setup().await;
        let actor = Uuid::new_v4();
        let created = manager
            .create_permission(request("read-user", "users", "read"), actor)
            .await
            .unwrap();

        let updated = manager
            .update_permission(
                created.id,
                UpdatePermissionRequest {
                    action: Some("view".to_string()),
                    ..Default::default()
                },
                actor,
            )
            .await
            .unwrap();
        assert_eq!(updated.action, "view");
        assert_eq!(updated.resource, "users");

        let err = manager.delete_permission(Uuid::new_v4(), actor).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
