pub mod menus;
pub mod permissions;
pub mod role_menus;
pub mod role_permissions;
pub mod roles;
pub mod user_roles;

pub use menus::{ActiveModel as MenuActiveModel, Column as MenuColumn, Entity as Menus, Model as Menu};
pub use permissions::{
    ActiveModel as PermissionActiveModel, Column as PermissionColumn, Entity as Permissions,
    Model as Permission,
};
pub use roles::{ActiveModel as RoleActiveModel, Column as RoleColumn, Entity as Roles, Model as Role};

// Junction entities
pub use role_menus::{
    ActiveModel as RoleMenuActiveModel, Column as RoleMenuColumn, Entity as RoleMenus, Model as RoleMenu,
};
pub use role_permissions::{
    ActiveModel as RolePermissionActiveModel, Column as RolePermissionColumn, Entity as RolePermissions,
    Model as RolePermission,
};
pub use user_roles::{
    ActiveModel as UserRoleActiveModel, Column as UserRoleColumn, Entity as UserRoles, Model as UserRole,
};
