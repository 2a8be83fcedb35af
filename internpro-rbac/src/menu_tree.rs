//! Menu tree and per-user menu resolution
//!
//! Trees are rebuilt on every call from `parent_id` lookups and go one
//! level deep: roots (or granted menus) with their direct children. Only
//! active, non-deleted menus appear anywhere in the output.

use internpro_storage::seaorm::repositories::{AssignmentRepository, MenuRepository};
use internpro_storage::RepositoryFactory;
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    error::{RbacError, RbacResult},
    models::{Menu, RoleMenu},
};

/// Resolves navigation menus for the admin tree view and for users
#[derive(Clone)]
pub struct MenuTreeResolver {
    menus: MenuRepository,
    assignments: AssignmentRepository,
}

impl MenuTreeResolver {
    pub fn new(repositories: &RepositoryFactory) -> Self {
        Self {
            menus: repositories.menu_repository(),
            assignments: repositories.assignment_repository(),
        }
    }

    /// Root menus with their children, both in ascending sort order
    #[instrument(skip(self))]
    pub async fn get_menu_tree(&self) -> RbacResult<Vec<Menu>> {
        let roots = self
            .menus
            .find_roots()
            .await
            .map_err(|e| RbacError::storage("get menu tree", e))?;

        let mut tree: Vec<Menu> = roots.into_iter().map(Menu::from).collect();
        self.attach_children(tree.iter_mut()).await?;

        debug!(roots = tree.len(), "Built menu tree");
        Ok(tree)
    }

    /// Every menu grant reachable through the user's roles, in menu sort
    /// order. A menu granted by several roles appears once per role.
    #[instrument(skip(self))]
    pub async fn get_user_menus(&self, user_id: Uuid) -> RbacResult<Vec<RoleMenu>> {
        let grants = self
            .assignments
            .find_user_menu_grants(user_id, false)
            .await
            .map_err(|e| RbacError::storage("get user menus", e))?;

        debug!(%user_id, grants = grants.len(), "Resolved user menus");
        Ok(grants.into_iter().map(RoleMenu::from).collect())
    }

    /// Viewable menu grants of the user, each menu carrying its children
    #[instrument(skip(self))]
    pub async fn get_user_accessible_menus(&self, user_id: Uuid) -> RbacResult<Vec<RoleMenu>> {
        let grants = self
            .assignments
            .find_user_menu_grants(user_id, true)
            .await
            .map_err(|e| RbacError::storage("get user accessible menus", e))?;

        let mut accessible: Vec<RoleMenu> = grants.into_iter().map(RoleMenu::from).collect();
        self.attach_children(accessible.iter_mut().map(|grant| &mut grant.menu))
            .await?;

        debug!(%user_id, grants = accessible.len(), "Resolved accessible menus");
        Ok(accessible)
    }

    /// Fill `children` of each menu with one batched query
    async fn attach_children<'a, I>(&self, parents: I) -> RbacResult<()>
    where
        I: Iterator<Item = &'a mut Menu>,
    {
        let mut parents: Vec<&'a mut Menu> = parents.collect();
        let parent_ids: Vec<Uuid> = parents.iter().map(|menu| menu.id).collect();

        let children = self
            .menus
            .find_children_of(&parent_ids)
            .await
            .map_err(|e| RbacError::storage("get menu children", e))?;

        let mut by_parent: HashMap<Uuid, Vec<Menu>> = HashMap::new();
        for child in children {
            if let Some(parent_id) = child.parent_id {
                by_parent.entry(parent_id).or_default().push(child.into());
            }
        }

        for parent in parents.iter_mut() {
            parent.children = by_parent.get(&parent.id).cloned().unwrap_or_default();
        }
        Ok(())
    }
}

/// Collapse grants for the same menu into one entry whose flags are the OR
/// of all of them. The first grant of each menu keeps its position and ids.
pub fn merge_menu_grants(grants: Vec<RoleMenu>) -> Vec<RoleMenu> {
    let mut merged: Vec<RoleMenu> = Vec::with_capacity(grants.len());
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for grant in grants {
        match index.get(&grant.menu_id) {
            Some(&position) => {
                let existing = &mut merged[position];
                existing.can_view |= grant.can_view;
                existing.can_create |= grant.can_create;
                existing.can_edit |= grant.can_edit;
                existing.can_delete |= grant.can_delete;
            }
            None => {
                index.insert(grant.menu_id, merged.len());
                merged.push(grant);
            }
        }
    }

    merged
}
