//! Data models for RBAC system
//!
//! These are the shapes handed to callers of the engine. Storage rows are
//! converted into them at the engine boundary; nothing here touches the
//! database.

use chrono::{DateTime, Utc};
use internpro_storage::seaorm::entities::{menus, permissions, role_menus, roles, user_roles};
use internpro_storage::seaorm::repositories::MenuGrant;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit trail shared by roles, permissions and menus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<Uuid>,
}

impl Lifecycle {
    /// Whether the record has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Role with optionally populated permissions and menus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub menus: Vec<Menu>,
}

/// Permission on a `(resource, action)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub resource: String,
    pub action: String,
    pub description: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
}

/// Navigation menu entry. `children` is only filled by the tree resolvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub url: String,
    pub icon: String,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub is_active: bool,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Menu>,
}

/// Menu grant of a role, carrying the menu it points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleMenu {
    pub id: Uuid,
    pub role_id: Uuid,
    pub menu_id: Uuid,
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub menu: Menu,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A role held by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub role: Role,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: Option<Uuid>,
}

/// A user holding a role, as listed by role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMember {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: Option<Uuid>,
}

// Requests

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePermissionRequest {
    pub name: String,
    pub slug: String,
    pub resource: String,
    pub action: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePermissionRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub resource: Option<String>,
    pub action: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMenuRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Menu patch. `parent_id` can move a menu under another one; detaching it
/// back to the root level is not expressible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMenuRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// One entry of a role's menu assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuPermissionRequest {
    pub menu_id: Uuid,
    #[serde(default)]
    pub can_view: bool,
    #[serde(default)]
    pub can_create: bool,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
}

impl MenuPermissionRequest {
    /// View-only grant on `menu_id`
    pub fn view(menu_id: Uuid) -> Self {
        Self {
            menu_id,
            can_view: true,
            can_create: false,
            can_edit: false,
            can_delete: false,
        }
    }

    /// Grant of every action on `menu_id`
    pub fn full(menu_id: Uuid) -> Self {
        Self {
            menu_id,
            can_view: true,
            can_create: true,
            can_edit: true,
            can_delete: true,
        }
    }
}

impl From<MenuPermissionRequest> for MenuGrant {
    fn from(request: MenuPermissionRequest) -> Self {
        Self {
            menu_id: request.menu_id,
            can_view: request.can_view,
            can_create: request.can_create,
            can_edit: request.can_edit,
            can_delete: request.can_delete,
        }
    }
}

/// Patch for the flags of an existing menu grant
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UpdateRoleMenuRequest {
    pub can_view: Option<bool>,
    pub can_create: Option<bool>,
    pub can_edit: Option<bool>,
    pub can_delete: Option<bool>,
}

// Responses

/// Result of a create operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: Uuid,
    pub message: String,
}

/// Paging information returned with list results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

/// One page of items with its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

// Conversions from storage rows

impl From<roles::Model> for Role {
    fn from(model: roles::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            is_active: model.is_active,
            lifecycle: Lifecycle {
                created_at: model.created_at,
                created_by: model.created_by,
                updated_at: model.updated_at,
                updated_by: model.updated_by,
                deleted_at: model.deleted_at,
                deleted_by: model.deleted_by,
            },
            permissions: Vec::new(),
            menus: Vec::new(),
        }
    }
}

impl From<permissions::Model> for Permission {
    fn from(model: permissions::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            resource: model.resource,
            action: model.action,
            description: model.description,
            is_active: model.is_active,
            lifecycle: Lifecycle {
                created_at: model.created_at,
                created_by: model.created_by,
                updated_at: model.updated_at,
                updated_by: model.updated_by,
                deleted_at: model.deleted_at,
                deleted_by: model.deleted_by,
            },
        }
    }
}

impl From<menus::Model> for Menu {
    fn from(model: menus::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            url: model.url,
            icon: model.icon,
            parent_id: model.parent_id,
            sort_order: model.sort_order,
            is_active: model.is_active,
            lifecycle: Lifecycle {
                created_at: model.created_at,
                created_by: model.created_by,
                updated_at: model.updated_at,
                updated_by: model.updated_by,
                deleted_at: model.deleted_at,
                deleted_by: model.deleted_by,
            },
            children: Vec::new(),
        }
    }
}

impl From<(role_menus::Model, menus::Model)> for RoleMenu {
    fn from((grant, menu): (role_menus::Model, menus::Model)) -> Self {
        Self {
            id: grant.id,
            role_id: grant.role_id,
            menu_id: grant.menu_id,
            can_view: grant.can_view,
            can_create: grant.can_create,
            can_edit: grant.can_edit,
            can_delete: grant.can_delete,
            menu: menu.into(),
            created_at: grant.created_at,
            updated_at: grant.updated_at,
        }
    }
}

impl From<(user_roles::Model, roles::Model)> for UserRoleAssignment {
    fn from((assignment, role): (user_roles::Model, roles::Model)) -> Self {
        Self {
            id: assignment.id,
            user_id: assignment.user_id,
            role_id: assignment.role_id,
            role: role.into(),
            assigned_at: assignment.assigned_at,
            assigned_by: assignment.assigned_by,
        }
    }
}

impl From<user_roles::Model> for RoleMember {
    fn from(assignment: user_roles::Model) -> Self {
        Self {
            id: assignment.id,
            user_id: assignment.user_id,
            role_id: assignment.role_id,
            assigned_at: assignment.assigned_at,
            assigned_by: assignment.assigned_by,
        }
    }
}
