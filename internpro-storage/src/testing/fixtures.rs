//! Entity models for tests. Every fixture is active and not deleted; the
//! name is derived from the slug so fixtures never collide on name.

use crate::seaorm::entities::{Menu, Permission, Role};
use chrono::Utc;
use uuid::Uuid;

/// An active role
pub fn role(slug: &str) -> Role {
    let now = Utc::now();
    Role {
        id: Uuid::new_v4(),
        name: format!("Role {}", slug),
        slug: slug.to_string(),
        description: String::new(),
        is_active: true,
        created_at: now,
        created_by: None,
        updated_at: now,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

/// An active permission on `resource`/`action`
pub fn permission(slug: &str, resource: &str, action: &str) -> Permission {
    let now = Utc::now();
    Permission {
        id: Uuid::new_v4(),
        name: format!("Permission {}", slug),
        slug: slug.to_string(),
        resource: resource.to_string(),
        action: action.to_string(),
        description: String::new(),
        is_active: true,
        created_at: now,
        created_by: None,
        updated_at: now,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

/// An active menu at `/<slug>`
pub fn menu(slug: &str, parent_id: Option<Uuid>, sort_order: i32) -> Menu {
    let now = Utc::now();
    Menu {
        id: Uuid::new_v4(),
        name: format!("Menu {}", slug),
        slug: slug.to_string(),
        url: format!("/{}", slug),
        icon: String::new(),
        parent_id,
        sort_order,
        is_active: true,
        created_at: now,
        created_by: None,
        updated_at: now,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}
