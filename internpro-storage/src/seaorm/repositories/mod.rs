pub mod assignment_repository;
pub mod menu_repository;
pub mod permission_repository;
pub mod role_repository;

pub use assignment_repository::{AssignmentRepository, MenuGrant};
pub use menu_repository::MenuRepository;
pub use permission_repository::PermissionRepository;
pub use role_repository::RoleRepository;

use crate::seaorm::connection::{DatabaseConnection, DatabaseError};

/// Repository factory for creating all repositories with shared connection
#[derive(Clone)]
pub struct RepositoryFactory {
    pub role_repo: RoleRepository,
    pub permission_repo: PermissionRepository,
    pub menu_repo: MenuRepository,
    pub assignment_repo: AssignmentRepository,
    db: DatabaseConnection,
}

impl RepositoryFactory {
    /// Create a new repository factory with shared database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            role_repo: RoleRepository::new(db.clone()),
            permission_repo: PermissionRepository::new(db.clone()),
            menu_repo: MenuRepository::new(db.clone()),
            assignment_repo: AssignmentRepository::new(db.clone()),
            db,
        }
    }

    /// Get the database connection
    pub fn database(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Check that the shared connection is usable
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        self.db.ping().await
    }

    /// Get the role repository
    pub fn role_repository(&self) -> RoleRepository {
        self.role_repo.clone()
    }

    /// Get the permission repository
    pub fn permission_repository(&self) -> PermissionRepository {
        self.permission_repo.clone()
    }

    /// Get the menu repository
    pub fn menu_repository(&self) -> MenuRepository {
        self.menu_repo.clone()
    }

    /// Get the assignment repository
    pub fn assignment_repository(&self) -> AssignmentRepository {
        self.assignment_repo.clone()
    }
}
