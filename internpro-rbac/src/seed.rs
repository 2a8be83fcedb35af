//! Default roles, permissions and menus for a fresh installation

use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::RbacResult,
    models::{CreateMenuRequest, CreatePermissionRequest, CreateRoleRequest},
    service::RbacService,
};

const DEFAULT_ROLES: &[(&str, &str, &str)] = &[
    ("Administrator", "admin", "Full system access"),
    ("User", "user", "Basic user access"),
];

const DEFAULT_PERMISSIONS: &[(&str, &str, &str, &str, &str)] = &[
    ("Create User", "create-user", "users", "create", "Create new users"),
    ("Read User", "read-user", "users", "read", "View user details"),
    ("Update User", "update-user", "users", "update", "Update user information"),
    ("Delete User", "delete-user", "users", "delete", "Delete users"),
    ("Manage Roles", "manage-roles", "roles", "manage", "Manage user roles"),
    ("Manage Permissions", "manage-permissions", "permissions", "manage", "Manage permissions"),
];

const DEFAULT_MENUS: &[(&str, &str, &str, &str, i32)] = &[
    ("Dashboard", "dashboard", "/dashboard", "dashboard", 1),
    ("Users", "users", "/users", "users", 2),
    ("Roles", "roles", "/roles", "security", 3),
    ("Permissions", "permissions", "/permissions", "key", 4),
];

const SUPER_ADMIN_NAME: &str = "Super Admin";
const SUPER_ADMIN_DESCRIPTION: &str = "Super administrator with full access to all system features";

/// Counts of records created by a seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub roles: usize,
    pub permissions: usize,
    pub menus: usize,
}

/// Create the default roles, permissions and root menus. Records whose slug
/// is already taken by a live record are left untouched, so running this
/// again is harmless.
#[instrument(skip(service))]
pub async fn seed_initial_data(service: &RbacService, actor: Uuid) -> RbacResult<SeedReport> {
    let mut report = SeedReport::default();

    for (name, slug, description) in DEFAULT_ROLES {
        if service.roles.find_role_by_slug(slug).await?.is_none() {
            service
                .roles
                .create_role(
                    CreateRoleRequest {
                        name: name.to_string(),
                        slug: slug.to_string(),
                        description: description.to_string(),
                        is_active: Some(true),
                    },
                    actor,
                )
                .await?;
            report.roles += 1;
        }
    }

    for (name, slug, resource, action, description) in DEFAULT_PERMISSIONS {
        if service.permissions.find_permission_by_slug(slug).await?.is_none() {
            service
                .permissions
                .create_permission(
                    CreatePermissionRequest {
                        name: name.to_string(),
                        slug: slug.to_string(),
                        resource: resource.to_string(),
                        action: action.to_string(),
                        description: description.to_string(),
                        is_active: Some(true),
                    },
                    actor,
                )
                .await?;
            report.permissions += 1;
        }
    }

    for (name, slug, url, icon, sort_order) in DEFAULT_MENUS {
        if service.menus.find_menu_by_slug(slug).await?.is_none() {
            service
                .menus
                .create_menu(
                    CreateMenuRequest {
                        name: name.to_string(),
                        slug: slug.to_string(),
                        url: url.to_string(),
                        icon: icon.to_string(),
                        parent_id: None,
                        sort_order: Some(*sort_order),
                        is_active: Some(true),
                    },
                    actor,
                )
                .await?;
            report.menus += 1;
        }
    }

    info!(
        roles = report.roles,
        permissions = report.permissions,
        menus = report.menus,
        "Seeded initial RBAC data"
    );
    Ok(report)
}

/// Make sure the super administrator role exists and `user_id` holds it,
/// keeping any roles the user already has. Returns the role id.
#[instrument(skip(service))]
pub async fn ensure_super_admin(service: &RbacService, user_id: Uuid) -> RbacResult<Uuid> {
    let slug = service.config().super_admin_slug.clone();

    let role_id = match service.roles.find_role_by_slug(&slug).await? {
        Some(role) => role.id,
        None => {
            let created = service
                .roles
                .create_role(
                    CreateRoleRequest {
                        name: SUPER_ADMIN_NAME.to_string(),
                        slug: slug.clone(),
                        description: SUPER_ADMIN_DESCRIPTION.to_string(),
                        is_active: Some(true),
                    },
                    user_id,
                )
                .await?;
            created.id
        }
    };

    if service.assignments.add_role_to_user(user_id, role_id, user_id).await? {
        info!(%user_id, %role_id, "Assigned super administrator role");
    }
    Ok(role_id)
}
