//! Menu management

use chrono::Utc;
use internpro_storage::seaorm::entities::menus;
use internpro_storage::seaorm::repositories::MenuRepository;
use internpro_storage::RepositoryFactory;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    cache::DecisionCache,
    config::RbacConfig,
    error::{missing, RbacError, RbacResult},
    models::{CreateMenuRequest, Created, ListResponse, Menu, UpdateMenuRequest},
    slugs,
};

/// Menu manager for handling menu operations
#[derive(Clone)]
pub struct MenuManager {
    menus: MenuRepository,
    config: RbacConfig,
    cache: DecisionCache,
}

impl MenuManager {
    /// Create a new menu manager
    pub fn new(repositories: &RepositoryFactory, config: RbacConfig, cache: DecisionCache) -> Self {
        Self {
            menus: repositories.menu_repository(),
            config,
            cache,
        }
    }

    /// Create a menu, optionally under an existing parent
    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create_menu(&self, request: CreateMenuRequest, actor: Uuid) -> RbacResult<Created> {
        slugs::require("name", &request.name)?;
        slugs::require("slug", &request.slug)?;
        self.validate_menu_slug(&request.slug, None).await?;
        if let Some(parent_id) = request.parent_id {
            self.ensure_parent_exists(parent_id).await?;
        }

        let now = Utc::now();
        let menu = menus::Model {
            id: Uuid::new_v4(),
            name: request.name,
            slug: request.slug,
            url: request.url,
            icon: request.icon,
            parent_id: request.parent_id,
            sort_order: request.sort_order.unwrap_or(0),
            is_active: request.is_active.unwrap_or(false),
            created_at: now,
            created_by: Some(actor),
            updated_at: now,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        };

        let menu = self
            .menus
            .create(menu)
            .await
            .map_err(|e| RbacError::storage("create menu", e))?;
        self.cache.invalidate_all();

        info!(menu_id = %menu.id, parent_id = ?menu.parent_id, %actor, "Menu created");
        Ok(Created {
            id: menu.id,
            message: "Menu created successfully".to_string(),
        })
    }

    pub async fn get_menu(&self, id: Uuid) -> RbacResult<Menu> {
        self.find_menu(id).await.map(Menu::from)
    }

    /// Get a menu even if it has been soft-deleted
    pub async fn get_menu_including_deleted(&self, id: Uuid) -> RbacResult<Menu> {
        self.menus
            .find_by_id_including_deleted(id)
            .await
            .map_err(|e| RbacError::storage("get menu", e))?
            .map(Menu::from)
            .ok_or_else(|| missing("Menu", id))
    }

    /// List live menus ordered by sort order and name
    pub async fn list_menus(
        &self,
        page: u64,
        limit: u64,
        search: Option<&str>,
    ) -> RbacResult<ListResponse<Menu>> {
        let query = self.config.list_query(page, limit, search);
        let page = self
            .menus
            .list(&query)
            .await
            .map_err(|e| RbacError::storage("list menus", e))?;

        debug!(total = page.total, page = query.page, "Listed menus");
        Ok(ListResponse {
            data: page.items.into_iter().map(Menu::from).collect(),
            meta: self.config.pagination_meta(&query, page.total),
        })
    }

    /// Apply the fields present in `request`. A menu can never become its
    /// own parent.
    #[instrument(skip(self, request))]
    pub async fn update_menu(
        &self,
        id: Uuid,
        request: UpdateMenuRequest,
        actor: Uuid,
    ) -> RbacResult<Menu> {
        let mut menu = self.find_menu(id).await?;

        if let Some(name) = request.name {
            slugs::require("name", &name)?;
            menu.name = name;
        }
        if let Some(slug) = request.slug {
            slugs::require("slug", &slug)?;
            self.validate_menu_slug(&slug, Some(id)).await?;
            menu.slug = slug;
        }
        if let Some(url) = request.url {
            menu.url = url;
        }
        if let Some(icon) = request.icon {
            menu.icon = icon;
        }
        if let Some(parent_id) = request.parent_id {
            if parent_id == id {
                warn!(menu_id = %id, "Rejected self-referencing menu parent");
                return Err(RbacError::validation("menu cannot be parent of itself"));
            }
            self.ensure_parent_exists(parent_id).await?;
            menu.parent_id = Some(parent_id);
        }
        if let Some(sort_order) = request.sort_order {
            menu.sort_order = sort_order;
        }
        if let Some(is_active) = request.is_active {
            menu.is_active = is_active;
        }
        menu.updated_at = Utc::now();
        menu.updated_by = Some(actor);

        let menu = self
            .menus
            .update(menu)
            .await
            .map_err(|e| RbacError::storage("update menu", e))?;
        self.cache.invalidate_all();

        info!(menu_id = %id, %actor, "Menu updated");
        Ok(menu.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_menu(&self, id: Uuid, actor: Uuid) -> RbacResult<()> {
        let deleted = self
            .menus
            .soft_delete(id, Some(actor))
            .await
            .map_err(|e| RbacError::storage("delete menu", e))?;
        if !deleted {
            return Err(missing("Menu", id));
        }
        self.cache.invalidate_all();

        info!(menu_id = %id, %actor, "Menu deleted");
        Ok(())
    }

    /// Fail with a conflict if a live menu other than `exclude_id` uses `slug`
    pub async fn validate_menu_slug(&self, slug: &str, exclude_id: Option<Uuid>) -> RbacResult<()> {
        let holder = self
            .menus
            .find_by_slug(slug)
            .await
            .map_err(|e| RbacError::storage("check menu slug", e))?;
        slugs::ensure_available("menu", slug, holder.map(|menu| menu.id), exclude_id)
    }

    /// Live menu by slug, if any
    pub async fn find_menu_by_slug(&self, slug: &str) -> RbacResult<Option<Menu>> {
        let menu = self
            .menus
            .find_by_slug(slug)
            .await
            .map_err(|e| RbacError::storage("get menu", e))?;
        Ok(menu.map(Menu::from))
    }

    async fn ensure_parent_exists(&self, parent_id: Uuid) -> RbacResult<()> {
        let parent = self
            .menus
            .find_by_id(parent_id)
            .await
            .map_err(|e| RbacError::storage("get parent menu", e))?;
        match parent {
            Some(_) => Ok(()),
            None => Err(missing("Parent menu", parent_id)),
        }
    }

    async fn find_menu(&self, id: Uuid) -> RbacResult<menus::Model> {
        self.menus
            .find_by_id(id)
            .await
            .map_err(|e| RbacError::storage("get menu", e))?
            .ok_or_else(|| missing("Menu", id))
    }
}
