use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Roles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Roles::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Roles::Slug).string_len(100).not_null())
                    .col(ColumnDef::new(Roles::Description).text().not_null().default(""))
                    .col(ColumnDef::new(Roles::IsActive).boolean().not_null().default(false))
                    .col(ColumnDef::new(Roles::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Roles::CreatedBy).uuid().null())
                    .col(ColumnDef::new(Roles::UpdatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Roles::UpdatedBy).uuid().null())
                    .col(ColumnDef::new(Roles::DeletedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Roles::DeletedBy).uuid().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Permissions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Permissions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Permissions::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Permissions::Slug).string_len(100).not_null())
                    .col(ColumnDef::new(Permissions::Resource).string_len(100).not_null())
                    .col(ColumnDef::new(Permissions::Action).string_len(50).not_null())
                    .col(ColumnDef::new(Permissions::Description).text().not_null().default(""))
                    .col(ColumnDef::new(Permissions::IsActive).boolean().not_null().default(false))
                    .col(ColumnDef::new(Permissions::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Permissions::CreatedBy).uuid().null())
                    .col(ColumnDef::new(Permissions::UpdatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Permissions::UpdatedBy).uuid().null())
                    .col(ColumnDef::new(Permissions::DeletedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Permissions::DeletedBy).uuid().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Menus::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Menus::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Menus::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Menus::Slug).string_len(100).not_null())
                    .col(ColumnDef::new(Menus::Url).string_len(255).not_null().default(""))
                    .col(ColumnDef::new(Menus::Icon).string_len(100).not_null().default(""))
                    .col(ColumnDef::new(Menus::ParentId).uuid().null())
                    .col(ColumnDef::new(Menus::SortOrder).integer().not_null().default(0))
                    .col(ColumnDef::new(Menus::IsActive).boolean().not_null().default(false))
                    .col(ColumnDef::new(Menus::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Menus::CreatedBy).uuid().null())
                    .col(ColumnDef::new(Menus::UpdatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Menus::UpdatedBy).uuid().null())
                    .col(ColumnDef::new(Menus::DeletedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Menus::DeletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_menus_parent_id")
                            .from(Menus::Table, Menus::ParentId)
                            .to(Menus::Table, Menus::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RolePermissions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RolePermissions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RolePermissions::RoleId).uuid().not_null())
                    .col(ColumnDef::new(RolePermissions::PermissionId).uuid().not_null())
                    .col(ColumnDef::new(RolePermissions::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(RolePermissions::CreatedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_permissions_role_id")
                            .from(RolePermissions::Table, RolePermissions::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_permissions_permission_id")
                            .from(RolePermissions::Table, RolePermissions::PermissionId)
                            .to(Permissions::Table, Permissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserRoles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserRoles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(UserRoles::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserRoles::RoleId).uuid().not_null())
                    .col(ColumnDef::new(UserRoles::AssignedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(UserRoles::AssignedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_role_id")
                            .from(UserRoles::Table, UserRoles::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RoleMenus::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RoleMenus::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RoleMenus::RoleId).uuid().not_null())
                    .col(ColumnDef::new(RoleMenus::MenuId).uuid().not_null())
                    .col(ColumnDef::new(RoleMenus::CanView).boolean().not_null().default(true))
                    .col(ColumnDef::new(RoleMenus::CanCreate).boolean().not_null().default(false))
                    .col(ColumnDef::new(RoleMenus::CanEdit).boolean().not_null().default(false))
                    .col(ColumnDef::new(RoleMenus::CanDelete).boolean().not_null().default(false))
                    .col(ColumnDef::new(RoleMenus::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(RoleMenus::CreatedBy).uuid().null())
                    .col(ColumnDef::new(RoleMenus::UpdatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(RoleMenus::UpdatedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_menus_role_id")
                            .from(RoleMenus::Table, RoleMenus::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_menus_menu_id")
                            .from(RoleMenus::Table, RoleMenus::MenuId)
                            .to(Menus::Table, Menus::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Junctions first so the foreign keys never dangle
        manager
            .drop_table(Table::drop().table(RoleMenus::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserRoles::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RolePermissions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Menus::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Permissions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    Name,
    Slug,
    Description,
    IsActive,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}

#[derive(Iden)]
enum Permissions {
    Table,
    Id,
    Name,
    Slug,
    Resource,
    Action,
    Description,
    IsActive,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}

#[derive(Iden)]
enum Menus {
    Table,
    Id,
    Name,
    Slug,
    Url,
    Icon,
    ParentId,
    SortOrder,
    IsActive,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}

#[derive(Iden)]
enum RolePermissions {
    Table,
    Id,
    RoleId,
    PermissionId,
    CreatedAt,
    CreatedBy,
}

#[derive(Iden)]
enum UserRoles {
    Table,
    Id,
    UserId,
    RoleId,
    AssignedAt,
    AssignedBy,
}

#[derive(Iden)]
enum RoleMenus {
    Table,
    Id,
    RoleId,
    MenuId,
    CanView,
    CanCreate,
    CanEdit,
    CanDelete,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
}
