use crate::seaorm::{
    connection::{DatabaseConnection, DatabaseError},
    entities::{permissions, Permission, PermissionActiveModel, Permissions},
    filters::{search_condition, ListQuery, Page},
    soft_delete::SoftDelete,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

/// Repository for permission records
#[derive(Clone)]
pub struct PermissionRepository {
    db: DatabaseConnection,
}

impl PermissionRepository {
    /// Create a new permission repository
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new permission
    pub async fn create(&self, permission: Permission) -> Result<Permission, DatabaseError> {
        let active_model = PermissionActiveModel {
            id: Set(permission.id),
            name: Set(permission.name),
            slug: Set(permission.slug),
            resource: Set(permission.resource),
            action: Set(permission.action),
            description: Set(permission.description),
            is_active: Set(permission.is_active),
            created_at: Set(permission.created_at),
            created_by: Set(permission.created_by),
            updated_at: Set(permission.updated_at),
            updated_by: Set(permission.updated_by),
            deleted_at: Set(None),
            deleted_by: Set(None),
        };

        let result = active_model.insert(self.db.get_connection()).await?;
        Ok(result)
    }

    /// Find a live permission by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Permission>, DatabaseError> {
        let permission = Permissions::find_active_by_id(id)
            .one(self.db.get_connection())
            .await?;
        Ok(permission)
    }

    /// Find a permission by id whether or not it has been soft-deleted
    pub async fn find_by_id_including_deleted(
        &self,
        id: Uuid,
    ) -> Result<Option<Permission>, DatabaseError> {
        let permission = Permissions::find_by_id(id).one(self.db.get_connection()).await?;
        Ok(permission)
    }

    /// Find a live permission by slug
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Permission>, DatabaseError> {
        let permission = Permissions::find_active()
            .filter(permissions::Column::Slug.eq(slug))
            .one(self.db.get_connection())
            .await?;
        Ok(permission)
    }

    /// Find all live permissions among `ids`
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Permission>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let permissions = Permissions::find_active()
            .filter(permissions::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.get_connection())
            .await?;
        Ok(permissions)
    }

    /// Live permissions for one resource, ordered by action
    pub async fn find_by_resource(&self, resource: &str) -> Result<Vec<Permission>, DatabaseError> {
        let permissions = Permissions::find_active()
            .filter(permissions::Column::Resource.eq(resource))
            .order_by_asc(permissions::Column::Action)
            .all(self.db.get_connection())
            .await?;
        Ok(permissions)
    }

    /// List live permissions ordered by resource then action
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Permission>, DatabaseError> {
        let mut select = Permissions::find_active();

        if let Some(term) = query.search_term() {
            select = select.filter(search_condition(
                &[
                    permissions::Column::Name,
                    permissions::Column::Slug,
                    permissions::Column::Resource,
                    permissions::Column::Action,
                ],
                term,
            ));
        }

        let paginator = select
            .order_by_asc(permissions::Column::Resource)
            .order_by_asc(permissions::Column::Action)
            .order_by_asc(permissions::Column::Slug)
            .paginate(self.db.get_connection(), query.limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(query.page_index()).await?;

        Ok(Page { items, total })
    }

    /// Persist the mutable fields of a permission
    pub async fn update(&self, permission: Permission) -> Result<Permission, DatabaseError> {
        let active_model = PermissionActiveModel {
            id: Set(permission.id),
            name: Set(permission.name),
            slug: Set(permission.slug),
            resource: Set(permission.resource),
            action: Set(permission.action),
            description: Set(permission.description),
            is_active: Set(permission.is_active),
            updated_at: Set(permission.updated_at),
            updated_by: Set(permission.updated_by),
            ..Default::default()
        };

        let updated = active_model.update(self.db.get_connection()).await?;
        Ok(updated)
    }

    /// Mark a live permission as deleted. Returns false if none matched.
    pub async fn soft_delete(&self, id: Uuid, actor: Option<Uuid>) -> Result<bool, DatabaseError> {
        let now = Utc::now();
        let result = Permissions::update_many()
            .col_expr(permissions::Column::DeletedAt, Expr::value(now))
            .col_expr(permissions::Column::DeletedBy, Expr::value(actor))
            .col_expr(permissions::Column::UpdatedAt, Expr::value(now))
            .col_expr(permissions::Column::UpdatedBy, Expr::value(actor))
            .filter(permissions::Column::Id.eq(id))
            .filter(permissions::Column::DeletedAt.is_null())
            .exec(self.db.get_connection())
            .await?;

        Ok(result.rows_affected > 0)
    }
}
