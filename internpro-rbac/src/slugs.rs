//! Slug and required-field checks shared by the managers

use tracing::warn;
use uuid::Uuid;

use crate::error::{RbacError, RbacResult};

/// Fail with a conflict when `holder` (the id of the live record currently
/// using the slug) is some record other than `exclude_id`.
pub(crate) fn ensure_available(
    entity: &'static str,
    slug: &str,
    holder: Option<Uuid>,
    exclude_id: Option<Uuid>,
) -> RbacResult<()> {
    match holder {
        Some(holder) if Some(holder) != exclude_id => {
            warn!(entity, slug, %holder, "Slug already in use");
            Err(RbacError::conflict(format!("{} slug already exists", entity)))
        }
        _ => Ok(()),
    }
}

/// Reject blank names and slugs
pub(crate) fn require(field: &'static str, value: &str) -> RbacResult<()> {
    if value.trim().is_empty() {
        return Err(RbacError::validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}
