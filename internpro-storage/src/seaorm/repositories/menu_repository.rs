use crate::seaorm::{
    connection::{DatabaseConnection, DatabaseError},
    entities::{menus, Menu, MenuActiveModel, Menus},
    filters::{search_condition, ListQuery, Page},
    soft_delete::SoftDelete,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select, Set,
};
use uuid::Uuid;

/// Repository for menu records
#[derive(Clone)]
pub struct MenuRepository {
    db: DatabaseConnection,
}

/// Live, enabled menus in display order
fn displayable() -> Select<Menus> {
    Menus::find_active()
        .filter(menus::Column::IsActive.eq(true))
        .order_by_asc(menus::Column::SortOrder)
        .order_by_asc(menus::Column::Name)
        .order_by_asc(menus::Column::Id)
}

impl MenuRepository {
    /// Create a new menu repository
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new menu
    pub async fn create(&self, menu: Menu) -> Result<Menu, DatabaseError> {
        let active_model = MenuActiveModel {
            id: Set(menu.id),
            name: Set(menu.name),
            slug: Set(menu.slug),
            url: Set(menu.url),
            icon: Set(menu.icon),
            parent_id: Set(menu.parent_id),
            sort_order: Set(menu.sort_order),
            is_active: Set(menu.is_active),
            created_at: Set(menu.created_at),
            created_by: Set(menu.created_by),
            updated_at: Set(menu.updated_at),
            updated_by: Set(menu.updated_by),
            deleted_at: Set(None),
            deleted_by: Set(None),
        };

        let result = active_model.insert(self.db.get_connection()).await?;
        Ok(result)
    }

    /// Find a live menu by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Menu>, DatabaseError> {
        let menu = Menus::find_active_by_id(id).one(self.db.get_connection()).await?;
        Ok(menu)
    }

    /// Find a menu by id whether or not it has been soft-deleted
    pub async fn find_by_id_including_deleted(&self, id: Uuid) -> Result<Option<Menu>, DatabaseError> {
        let menu = Menus::find_by_id(id).one(self.db.get_connection()).await?;
        Ok(menu)
    }

    /// Find a live menu by slug
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Menu>, DatabaseError> {
        let menu = Menus::find_active()
            .filter(menus::Column::Slug.eq(slug))
            .one(self.db.get_connection())
            .await?;
        Ok(menu)
    }

    /// Find all live menus among `ids`
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Menu>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let menus = Menus::find_active()
            .filter(menus::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.get_connection())
            .await?;
        Ok(menus)
    }

    /// Live, enabled menus without a parent
    pub async fn find_roots(&self) -> Result<Vec<Menu>, DatabaseError> {
        let roots = displayable()
            .filter(menus::Column::ParentId.is_null())
            .all(self.db.get_connection())
            .await?;
        Ok(roots)
    }

    /// Live, enabled direct children of any of `parent_ids`, in one query
    pub async fn find_children_of(&self, parent_ids: &[Uuid]) -> Result<Vec<Menu>, DatabaseError> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let children = displayable()
            .filter(menus::Column::ParentId.is_in(parent_ids.iter().copied()))
            .all(self.db.get_connection())
            .await?;
        Ok(children)
    }

    /// List live menus ordered by sort order then name
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Menu>, DatabaseError> {
        let mut select = Menus::find_active();

        if let Some(term) = query.search_term() {
            select = select.filter(search_condition(
                &[menus::Column::Name, menus::Column::Slug, menus::Column::Url],
                term,
            ));
        }

        let paginator = select
            .order_by_asc(menus::Column::SortOrder)
            .order_by_asc(menus::Column::Name)
            .order_by_asc(menus::Column::Id)
            .paginate(self.db.get_connection(), query.limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(query.page_index()).await?;

        Ok(Page { items, total })
    }

    /// Persist the mutable fields of a menu
    pub async fn update(&self, menu: Menu) -> Result<Menu, DatabaseError> {
        let active_model = MenuActiveModel {
            id: Set(menu.id),
            name: Set(menu.name),
            slug: Set(menu.slug),
            url: Set(menu.url),
            icon: Set(menu.icon),
            parent_id: Set(menu.parent_id),
            sort_order: Set(menu.sort_order),
            is_active: Set(menu.is_active),
            updated_at: Set(menu.updated_at),
            updated_by: Set(menu.updated_by),
            ..Default::default()
        };

        let updated = active_model.update(self.db.get_connection()).await?;
        Ok(updated)
    }

    /// Mark a live menu as deleted. Returns false if none matched.
    pub async fn soft_delete(&self, id: Uuid, actor: Option<Uuid>) -> Result<bool, DatabaseError> {
        let now = Utc::now();
        let result = Menus::update_many()
            .col_expr(menus::Column::DeletedAt, Expr::value(now))
            .col_expr(menus::Column::DeletedBy, Expr::value(actor))
            .col_expr(menus::Column::UpdatedAt, Expr::value(now))
            .col_expr(menus::Column::UpdatedBy, Expr::value(actor))
            .filter(menus::Column::Id.eq(id))
            .filter(menus::Column::DeletedAt.is_null())
            .exec(self.db.get_connection())
            .await?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, TestDatabase};

    #[tokio::test]
    async fn test_roots_and_children() {
        let db = TestDatabase::new_in_memory().await.unwrap();
        let repo = db.repositories().menu_repository();

        let settings = repo.create(fixtures::menu("settings", None, 2)).await.unwrap();
        let dashboard = repo.create(fixtures::menu("dashboard", None, 1)).await.unwrap();
        repo.create(fixtures::menu("profile", Some(settings.id), 2))
            .await
            .unwrap();
        repo.create(fixtures::menu("security", Some(settings.id), 1))
            .await
            .unwrap();

        let mut hidden = fixtures::menu("hidden", Some(dashboard.id), 1);
        hidden.is_active = false;
        repo.create(hidden).await.unwrap();

        let roots: Vec<String> = repo
            .find_roots()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.slug)
            .collect();
        assert_eq!(roots, vec!["dashboard", "settings"]);

        let children: Vec<String> = repo
            .find_children_of(&[dashboard.id, settings.id])
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.slug)
            .collect();
        assert_eq!(children, vec!["security", "profile"]);
    }

    #[tokio::test]
    async fn test_deleted_child_is_excluded() {
        let db = TestDatabase::new_in_memory().await.unwrap();
        let repo = db.repositories().menu_repository();

        let root = repo.create(fixtures::menu("root", None, 1)).await.unwrap();
        let child = repo.create(fixtures::menu("child", Some(root.id), 1)).await.unwrap();
        repo.soft_delete(child.id, None).await.unwrap();

        assert!(repo.find_children_of(&[root.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_searches_url() {
        let db = TestDatabase::new_in_memory().await.unwrap();
        let repo = db.repositories().menu_repository();

        let mut users = fixtures::menu("users", None, 2);
        users.url = "/Admin/Users".to_string();
        repo.create(users).await.unwrap();
        repo.create(fixtures::menu("dashboard", None, 1)).await.unwrap();

        let page = repo
            .list(&ListQuery::new(1, 10).with_search("admin/users"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "users");
    }
}
