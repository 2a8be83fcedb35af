use sea_orm_migration::prelude::*;

/// Uniqueness that only applies to live rows, so a soft-deleted record's
/// name or slug can be taken again.
const PARTIAL_UNIQUE_INDEXES: [(&str, &str, &str); 5] = [
    ("idx_roles_name_active", "roles", "name"),
    ("idx_roles_slug_active", "roles", "slug"),
    ("idx_permissions_name_active", "permissions", "name"),
    ("idx_permissions_slug_active", "permissions", "slug"),
    ("idx_menus_slug_active", "menus", "slug"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for (name, table, column) in PARTIAL_UNIQUE_INDEXES {
            db.execute_unprepared(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {name} ON {table} ({column}) WHERE deleted_at IS NULL"
            ))
            .await?;
        }

        // Junction pairs are unique outright
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_role_permissions_unique")
                    .table(RolePermissions::Table)
                    .col(RolePermissions::RoleId)
                    .col(RolePermissions::PermissionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_roles_unique")
                    .table(UserRoles::Table)
                    .col(UserRoles::UserId)
                    .col(UserRoles::RoleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_role_menus_unique")
                    .table(RoleMenus::Table)
                    .col(RoleMenus::RoleId)
                    .col(RoleMenus::MenuId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Lookup indexes for the authorization joins
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_role_permissions_permission_id")
                    .table(RolePermissions::Table)
                    .col(RolePermissions::PermissionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_roles_role_id")
                    .table(UserRoles::Table)
                    .col(UserRoles::RoleId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_role_menus_menu_id")
                    .table(RoleMenus::Table)
                    .col(RoleMenus::MenuId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_permissions_resource_action")
                    .table(Permissions::Table)
                    .col(Permissions::Resource)
                    .col(Permissions::Action)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_menus_parent_id")
                    .table(Menus::Table)
                    .col(Menus::ParentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let indexes = vec![
            "idx_menus_parent_id",
            "idx_permissions_resource_action",
            "idx_role_menus_menu_id",
            "idx_user_roles_role_id",
            "idx_role_permissions_permission_id",
            "idx_role_menus_unique",
            "idx_user_roles_unique",
            "idx_role_permissions_unique",
        ];

        for index_name in indexes {
            manager
                .drop_index(Index::drop().name(index_name).to_owned())
                .await?;
        }

        let db = manager.get_connection();
        for (name, _, _) in PARTIAL_UNIQUE_INDEXES {
            db.execute_unprepared(&format!("DROP INDEX IF EXISTS {name}"))
                .await?;
        }

        Ok(())
    }
}

#[derive(Iden)]
enum Permissions {
    Table,
    Resource,
    Action,
}

#[derive(Iden)]
enum Menus {
    Table,
    ParentId,
}

#[derive(Iden)]
enum RolePermissions {
    Table,
    RoleId,
    PermissionId,
}

#[derive(Iden)]
enum UserRoles {
    Table,
    UserId,
    RoleId,
}

#[derive(Iden)]
enum RoleMenus {
    Table,
    RoleId,
    MenuId,
}
