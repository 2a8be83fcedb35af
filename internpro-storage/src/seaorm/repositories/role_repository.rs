use crate::seaorm::{
    connection::{DatabaseConnection, DatabaseError},
    entities::{roles, Role, RoleActiveModel, Roles},
    filters::{search_condition, ListQuery, Page},
    soft_delete::SoftDelete,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

/// Repository for role records
#[derive(Clone)]
pub struct RoleRepository {
    db: DatabaseConnection,
}

impl RoleRepository {
    /// Create a new role repository
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new role
    pub async fn create(&self, role: Role) -> Result<Role, DatabaseError> {
        let active_model = RoleActiveModel {
            id: Set(role.id),
            name: Set(role.name),
            slug: Set(role.slug),
            description: Set(role.description),
            is_active: Set(role.is_active),
            created_at: Set(role.created_at),
            created_by: Set(role.created_by),
            updated_at: Set(role.updated_at),
            updated_by: Set(role.updated_by),
            deleted_at: Set(None),
            deleted_by: Set(None),
        };

        let result = active_model.insert(self.db.get_connection()).await?;
        Ok(result)
    }

    /// Find a live role by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, DatabaseError> {
        let role = Roles::find_active_by_id(id).one(self.db.get_connection()).await?;
        Ok(role)
    }

    /// Find a role by id whether or not it has been soft-deleted
    pub async fn find_by_id_including_deleted(&self, id: Uuid) -> Result<Option<Role>, DatabaseError> {
        let role = Roles::find_by_id(id).one(self.db.get_connection()).await?;
        Ok(role)
    }

    /// Find a live role by slug
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Role>, DatabaseError> {
        let role = Roles::find_active()
            .filter(roles::Column::Slug.eq(slug))
            .one(self.db.get_connection())
            .await?;
        Ok(role)
    }

    /// Find all live roles among `ids`
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Role>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let roles = Roles::find_active()
            .filter(roles::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.get_connection())
            .await?;
        Ok(roles)
    }

    /// List live roles, newest first
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Role>, DatabaseError> {
        let mut select = Roles::find_active();

        if let Some(term) = query.search_term() {
            select = select.filter(search_condition(
                &[roles::Column::Name, roles::Column::Slug, roles::Column::Description],
                term,
            ));
        }

        let paginator = select
            .order_by_desc(roles::Column::CreatedAt)
            .order_by_asc(roles::Column::Id)
            .paginate(self.db.get_connection(), query.limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(query.page_index()).await?;

        Ok(Page { items, total })
    }

    /// Persist the mutable fields of a role
    pub async fn update(&self, role: Role) -> Result<Role, DatabaseError> {
        let active_model = RoleActiveModel {
            id: Set(role.id),
            name: Set(role.name),
            slug: Set(role.slug),
            description: Set(role.description),
            is_active: Set(role.is_active),
            updated_at: Set(role.updated_at),
            updated_by: Set(role.updated_by),
            ..Default::default()
        };

        let updated = active_model.update(self.db.get_connection()).await?;
        Ok(updated)
    }

    /// Mark a live role as deleted. Returns false if no live role had this id.
    pub async fn soft_delete(&self, id: Uuid, actor: Option<Uuid>) -> Result<bool, DatabaseError> {
        let now = Utc::now();
        let result = Roles::update_many()
            .col_expr(roles::Column::DeletedAt, Expr::value(now))
            .col_expr(roles::Column::DeletedBy, Expr::value(actor))
            .col_expr(roles::Column::UpdatedAt, Expr::value(now))
            .col_expr(roles::Column::UpdatedBy, Expr::value(actor))
            .filter(roles::Column::Id.eq(id))
            .filter(roles::Column::DeletedAt.is_null())
            .exec(self.db.get_connection())
            .await?;

        Ok(result.rows_affected > 0)
    }
}
