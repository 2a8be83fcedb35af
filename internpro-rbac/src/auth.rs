//! Authentication context handed over by the authentication layer

use axum::http::Extensions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the caller of a request. The authentication layer places it
/// in the request extensions; the route guards only read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
}

impl AuthContext {
    /// Create a new authentication context
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    /// Context stored in `extensions`, if the caller was authenticated
    pub fn from_extensions(extensions: &Extensions) -> Option<Self> {
        extensions.get::<AuthContext>().copied()
    }
}
