//! RBAC (Role-Based Access Control) core for InternPro
//!
//! This crate provides the authorization engine of the school-management
//! backend:
//! - Roles, permissions and navigation menus with soft delete and audit data
//! - Replace-all assignment of permissions and menus to roles and roles to users
//! - Permission and role checks, optionally cached in-process
//! - Menu trees and per-user accessible menus
//! - axum route guards built on the checks

pub mod assignments;
pub mod auth;
pub mod cache;
pub mod config;
mod deadline;
pub mod enforcer;
pub mod error;
pub mod menu_tree;
pub mod menus;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod roles;
pub mod seed;
pub mod service;
mod slugs;

pub use assignments::AssignmentManager;
pub use auth::AuthContext;
pub use cache::{DecisionCache, DecisionKey};
pub use config::RbacConfig;
pub use enforcer::{Authorizer, RbacEnforcer};
pub use error::{RbacError, RbacResult};
pub use menu_tree::{merge_menu_grants, MenuTreeResolver};
pub use menus::MenuManager;
pub use middleware::{RbacGuard, Requirement};
pub use models::{
    Created, Lifecycle, ListResponse, Menu, MenuPermissionRequest, PaginationMeta, Permission, Role,
    RoleMember, RoleMenu, UserRoleAssignment,
};
pub use permissions::PermissionManager;
pub use roles::RoleManager;
pub use seed::{ensure_super_admin, seed_initial_data, SeedReport};
pub use service::RbacService;
