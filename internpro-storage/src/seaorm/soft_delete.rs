//! Soft-delete scoping
//!
//! Every read of roles, permissions and menus that should only see live
//! records starts from [`SoftDelete::find_active`], so the
//! `deleted_at IS NULL` predicate is part of the query by construction.

use super::entities::{menus, permissions, roles};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Select};
use uuid::Uuid;

pub trait SoftDelete: EntityTrait {
    /// Column holding the deletion timestamp
    fn deleted_at_column() -> Self::Column;

    /// Primary key column
    fn id_column() -> Self::Column;

    /// Select records that have not been soft-deleted
    fn find_active() -> Select<Self> {
        Self::find().filter(Self::deleted_at_column().is_null())
    }

    /// Select a single record by id if it has not been soft-deleted
    fn find_active_by_id(id: Uuid) -> Select<Self> {
        Self::find_active().filter(Self::id_column().eq(id))
    }

    /// Select soft-deleted records only
    fn find_deleted() -> Select<Self> {
        Self::find().filter(Self::deleted_at_column().is_not_null())
    }
}

impl SoftDelete for roles::Entity {
    fn deleted_at_column() -> Self::Column {
        roles::Column::DeletedAt
    }

    fn id_column() -> Self::Column {
        roles::Column::Id
    }
}

impl SoftDelete for permissions::Entity {
    fn deleted_at_column() -> Self::Column {
        permissions::Column::DeletedAt
    }

    fn id_column() -> Self::Column {
        permissions::Column::Id
    }
}

impl SoftDelete for menus::Entity {
    fn deleted_at_column() -> Self::Column {
        menus::Column::DeletedAt
    }

    fn id_column() -> Self::Column {
        menus::Column::Id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_find_active_filters_deleted_rows() {
        let sql = roles::Entity::find_active().build(DbBackend::Sqlite).to_string();
        assert!(sql.contains(r#""roles"."deleted_at" IS NULL"#));
    }

    #[test]
    fn test_find_active_by_id_keeps_deleted_filter() {
        let sql = menus::Entity::find_active_by_id(Uuid::nil())
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains(r#""menus"."deleted_at" IS NULL"#));
        assert!(sql.contains(r#""menus"."id" = "#));
    }

    #[test]
    fn test_find_deleted_inverts_filter() {
        let sql = permissions::Entity::find_deleted().build(DbBackend::Sqlite).to_string();
        assert!(sql.contains(r#""permissions"."deleted_at" IS NOT NULL"#));
    }
}
