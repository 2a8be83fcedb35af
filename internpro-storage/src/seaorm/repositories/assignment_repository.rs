//! Junction-table access: role grants, menu grants and user role assignments,
//! plus the join queries the authorization checks are built on.

use crate::seaorm::{
    connection::{DatabaseConnection, DatabaseError},
    entities::{
        menus, permissions, role_menus, role_permissions, roles, user_roles, Menu, Menus, Permission,
        Permissions, Role, RoleMenu, RoleMenuActiveModel, RoleMenus, RolePermissionActiveModel,
        RolePermissions, Roles, UserRole, UserRoleActiveModel, UserRoles,
    },
    filters::{ListQuery, Page},
    soft_delete::SoftDelete,
};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Flags granted on one menu by a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuGrant {
    pub menu_id: Uuid,
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

/// Repository for the role_permissions, role_menus and user_roles tables
#[derive(Clone)]
pub struct AssignmentRepository {
    db: DatabaseConnection,
}

impl AssignmentRepository {
    /// Create a new assignment repository
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // Role -> permission

    /// Replace the complete permission set of a role in one transaction
    pub async fn replace_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
        actor: Option<Uuid>,
    ) -> Result<(), DatabaseError> {
        let txn = self.db.get_connection().begin().await?;

        let removed = RolePermissions::delete_many()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;

        if !permission_ids.is_empty() {
            let rows = permission_ids.iter().map(|permission_id| RolePermissionActiveModel {
                role_id: Set(role_id),
                permission_id: Set(*permission_id),
                created_by: Set(actor),
                ..ActiveModelBehavior::new()
            });
            RolePermissions::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;

        debug!(
            %role_id,
            removed = removed.rows_affected,
            inserted = permission_ids.len(),
            "Replaced role permissions"
        );
        Ok(())
    }

    /// Remove only the listed permissions from a role
    pub async fn remove_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<u64, DatabaseError> {
        if permission_ids.is_empty() {
            return Ok(0);
        }

        let result = RolePermissions::delete_many()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .filter(role_permissions::Column::PermissionId.is_in(permission_ids.iter().copied()))
            .exec(self.db.get_connection())
            .await?;
        Ok(result.rows_affected)
    }

    /// Live, enabled permissions granted to a role
    pub async fn find_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, DatabaseError> {
        let permissions = Permissions::find_active()
            .filter(permissions::Column::IsActive.eq(true))
            .join(JoinType::InnerJoin, permissions::Relation::RolePermissions.def())
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .order_by_asc(permissions::Column::Resource)
            .order_by_asc(permissions::Column::Action)
            .all(self.db.get_connection())
            .await?;
        Ok(permissions)
    }

    // Role -> menu

    /// Replace the complete menu grant set of a role in one transaction
    pub async fn replace_role_menus(
        &self,
        role_id: Uuid,
        grants: &[MenuGrant],
        actor: Option<Uuid>,
    ) -> Result<(), DatabaseError> {
        let txn = self.db.get_connection().begin().await?;

        let removed = RoleMenus::delete_many()
            .filter(role_menus::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;

        if !grants.is_empty() {
            let rows = grants.iter().map(|grant| RoleMenuActiveModel {
                role_id: Set(role_id),
                menu_id: Set(grant.menu_id),
                can_view: Set(grant.can_view),
                can_create: Set(grant.can_create),
                can_edit: Set(grant.can_edit),
                can_delete: Set(grant.can_delete),
                created_by: Set(actor),
                updated_by: Set(actor),
                ..ActiveModelBehavior::new()
            });
            RoleMenus::insert_many(rows).exec_without_returning(&txn).await?;
        }

        txn.commit().await?;

        debug!(
            %role_id,
            removed = removed.rows_affected,
            inserted = grants.len(),
            "Replaced role menus"
        );
        Ok(())
    }

    /// Remove only the listed menus from a role
    pub async fn remove_role_menus(&self, role_id: Uuid, menu_ids: &[Uuid]) -> Result<u64, DatabaseError> {
        if menu_ids.is_empty() {
            return Ok(0);
        }

        let result = RoleMenus::delete_many()
            .filter(role_menus::Column::RoleId.eq(role_id))
            .filter(role_menus::Column::MenuId.is_in(menu_ids.iter().copied()))
            .exec(self.db.get_connection())
            .await?;
        Ok(result.rows_affected)
    }

    /// Menu grants of a role joined with their live, enabled menus
    pub async fn find_role_menus(&self, role_id: Uuid) -> Result<Vec<(RoleMenu, Menu)>, DatabaseError> {
        let rows = RoleMenus::find()
            .find_also_related(Menus)
            .filter(role_menus::Column::RoleId.eq(role_id))
            .filter(menus::Column::IsActive.eq(true))
            .filter(menus::Column::DeletedAt.is_null())
            .order_by_asc(menus::Column::SortOrder)
            .order_by_asc(menus::Column::Name)
            .all(self.db.get_connection())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(grant, menu)| menu.map(|menu| (grant, menu)))
            .collect())
    }

    /// Find a single menu grant by its own id
    pub async fn find_role_menu(&self, id: Uuid) -> Result<Option<RoleMenu>, DatabaseError> {
        let grant = RoleMenus::find_by_id(id).one(self.db.get_connection()).await?;
        Ok(grant)
    }

    /// Overwrite the four flags of an existing menu grant
    pub async fn update_role_menu(&self, grant: RoleMenu) -> Result<RoleMenu, DatabaseError> {
        let active_model = RoleMenuActiveModel {
            id: Set(grant.id),
            can_view: Set(grant.can_view),
            can_create: Set(grant.can_create),
            can_edit: Set(grant.can_edit),
            can_delete: Set(grant.can_delete),
            updated_at: Set(grant.updated_at),
            updated_by: Set(grant.updated_by),
            ..Default::default()
        };

        let updated = active_model.update(self.db.get_connection()).await?;
        Ok(updated)
    }

    // User -> role

    /// Replace the complete role set of a user in one transaction
    pub async fn replace_user_roles(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
        actor: Option<Uuid>,
    ) -> Result<(), DatabaseError> {
        let txn = self.db.get_connection().begin().await?;

        let removed = UserRoles::delete_many()
            .filter(user_roles::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        if !role_ids.is_empty() {
            let rows = role_ids.iter().map(|role_id| UserRoleActiveModel {
                user_id: Set(user_id),
                role_id: Set(*role_id),
                assigned_by: Set(actor),
                ..ActiveModelBehavior::new()
            });
            UserRoles::insert_many(rows).exec_without_returning(&txn).await?;
        }

        txn.commit().await?;

        debug!(
            %user_id,
            removed = removed.rows_affected,
            inserted = role_ids.len(),
            "Replaced user roles"
        );
        Ok(())
    }

    /// Give a user one more role, leaving existing assignments alone.
    /// Returns false if the user already held it.
    pub async fn add_user_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<bool, DatabaseError> {
        let existing = UserRoles::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .filter(user_roles::Column::RoleId.eq(role_id))
            .count(self.db.get_connection())
            .await?;
        if existing > 0 {
            return Ok(false);
        }

        let active_model = UserRoleActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id),
            assigned_by: Set(actor),
            ..ActiveModelBehavior::new()
        };
        active_model.insert(self.db.get_connection()).await?;
        Ok(true)
    }

    /// Remove only the listed roles from a user
    pub async fn remove_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> Result<u64, DatabaseError> {
        if role_ids.is_empty() {
            return Ok(0);
        }

        let result = UserRoles::delete_many()
            .filter(user_roles::Column::UserId.eq(user_id))
            .filter(user_roles::Column::RoleId.is_in(role_ids.iter().copied()))
            .exec(self.db.get_connection())
            .await?;
        Ok(result.rows_affected)
    }

    /// Role assignments of a user joined with their non-deleted roles
    pub async fn find_user_roles(&self, user_id: Uuid) -> Result<Vec<(UserRole, Role)>, DatabaseError> {
        let rows = UserRoles::find()
            .find_also_related(Roles)
            .filter(user_roles::Column::UserId.eq(user_id))
            .filter(roles::Column::DeletedAt.is_null())
            .order_by_asc(user_roles::Column::AssignedAt)
            .order_by_asc(roles::Column::Slug)
            .all(self.db.get_connection())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(assignment, role)| role.map(|role| (assignment, role)))
            .collect())
    }

    /// Users holding a role, most recently assigned first
    pub async fn find_users_by_role(
        &self,
        role_id: Uuid,
        query: &ListQuery,
    ) -> Result<Page<UserRole>, DatabaseError> {
        let paginator = UserRoles::find()
            .filter(user_roles::Column::RoleId.eq(role_id))
            .order_by_desc(user_roles::Column::AssignedAt)
            .order_by_asc(user_roles::Column::UserId)
            .paginate(self.db.get_connection(), query.limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(query.page_index()).await?;

        Ok(Page { items, total })
    }

    // Authorization joins

    /// Number of paths user -> active role -> active permission(resource, action)
    pub async fn count_user_permission(
        &self,
        user_id: Uuid,
        resource: &str,
        action: &str,
    ) -> Result<u64, DatabaseError> {
        let count = UserRoles::find()
            .join(JoinType::InnerJoin, user_roles::Relation::Role.def())
            .join(JoinType::InnerJoin, roles::Relation::RolePermissions.def())
            .join(JoinType::InnerJoin, role_permissions::Relation::Permission.def())
            .filter(user_roles::Column::UserId.eq(user_id))
            .filter(roles::Column::IsActive.eq(true))
            .filter(roles::Column::DeletedAt.is_null())
            .filter(permissions::Column::Resource.eq(resource))
            .filter(permissions::Column::Action.eq(action))
            .filter(permissions::Column::IsActive.eq(true))
            .filter(permissions::Column::DeletedAt.is_null())
            .count(self.db.get_connection())
            .await?;
        Ok(count)
    }

    /// Number of active roles with `role_slug` held by the user
    pub async fn count_user_role(&self, user_id: Uuid, role_slug: &str) -> Result<u64, DatabaseError> {
        let count = UserRoles::find()
            .join(JoinType::InnerJoin, user_roles::Relation::Role.def())
            .filter(user_roles::Column::UserId.eq(user_id))
            .filter(roles::Column::Slug.eq(role_slug))
            .filter(roles::Column::IsActive.eq(true))
            .filter(roles::Column::DeletedAt.is_null())
            .count(self.db.get_connection())
            .await?;
        Ok(count)
    }

    /// Number of grants of the active permission `permission_slug` to a role
    pub async fn count_role_permission(
        &self,
        role_id: Uuid,
        permission_slug: &str,
    ) -> Result<u64, DatabaseError> {
        let count = RolePermissions::find()
            .join(JoinType::InnerJoin, role_permissions::Relation::Permission.def())
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .filter(permissions::Column::Slug.eq(permission_slug))
            .filter(permissions::Column::IsActive.eq(true))
            .filter(permissions::Column::DeletedAt.is_null())
            .count(self.db.get_connection())
            .await?;
        Ok(count)
    }

    /// Distinct active permissions reachable through the user's active roles
    pub async fn find_user_permissions(&self, user_id: Uuid) -> Result<Vec<Permission>, DatabaseError> {
        let permissions = Permissions::find_active()
            .filter(permissions::Column::IsActive.eq(true))
            .join(JoinType::InnerJoin, permissions::Relation::RolePermissions.def())
            .join(JoinType::InnerJoin, role_permissions::Relation::Role.def())
            .join(JoinType::InnerJoin, roles::Relation::UserRoles.def())
            .filter(user_roles::Column::UserId.eq(user_id))
            .filter(roles::Column::IsActive.eq(true))
            .filter(roles::Column::DeletedAt.is_null())
            .distinct()
            .order_by_asc(permissions::Column::Resource)
            .order_by_asc(permissions::Column::Action)
            .all(self.db.get_connection())
            .await?;
        Ok(permissions)
    }

    /// Menu grants reachable through the user's active roles, each with its
    /// live, enabled menu, ordered by menu sort order. Rows are not merged
    /// across roles.
    pub async fn find_user_menu_grants(
        &self,
        user_id: Uuid,
        viewable_only: bool,
    ) -> Result<Vec<(RoleMenu, Menu)>, DatabaseError> {
        let mut select = RoleMenus::find()
            .find_also_related(Menus)
            .join(JoinType::InnerJoin, role_menus::Relation::Role.def())
            .join(JoinType::InnerJoin, roles::Relation::UserRoles.def())
            .filter(user_roles::Column::UserId.eq(user_id))
            .filter(roles::Column::IsActive.eq(true))
            .filter(roles::Column::DeletedAt.is_null())
            .filter(menus::Column::IsActive.eq(true))
            .filter(menus::Column::DeletedAt.is_null());

        if viewable_only {
            select = select.filter(role_menus::Column::CanView.eq(true));
        }

        let rows = select
            .order_by_asc(menus::Column::SortOrder)
            .order_by_asc(menus::Column::Name)
            .order_by_asc(role_menus::Column::Id)
            .all(self.db.get_connection())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(grant, menu)| menu.map(|menu| (grant, menu)))
            .collect())
    }
}
