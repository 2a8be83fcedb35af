//! HTTP middleware for RBAC authorization
//!
//! ```ignore
//! let guard = Arc::new(RbacGuard::permission(authorizer, "users", "create"));
//! let router = Router::new()
//!     .route("/users", post(create_user))
//!     .route_layer(middleware::from_fn_with_state(guard, RbacGuard::enforce));
//! ```

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::{auth::AuthContext, config::RbacConfig, enforcer::Authorizer};

/// What a guarded route demands of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Permission { resource: String, action: String },
    AnyPermission(Vec<(String, String)>),
    Role(String),
    AnyRole(Vec<String>),
}

/// Route guard state
#[derive(Clone)]
pub struct RbacGuard {
    authorizer: Arc<dyn Authorizer>,
    requirement: Requirement,
}

impl RbacGuard {
    /// Guard requiring an arbitrary requirement
    pub fn new(authorizer: Arc<dyn Authorizer>, requirement: Requirement) -> Self {
        Self {
            authorizer,
            requirement,
        }
    }

    /// Require a permission on `(resource, action)`
    pub fn permission(
        authorizer: Arc<dyn Authorizer>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self::new(
            authorizer,
            Requirement::Permission {
                resource: resource.into(),
                action: action.into(),
            },
        )
    }

    /// Require any one of the permissions
    pub fn any_permission(authorizer: Arc<dyn Authorizer>, permissions: Vec<(String, String)>) -> Self {
        Self::new(authorizer, Requirement::AnyPermission(permissions))
    }

    /// Require the role with `slug`
    pub fn role(authorizer: Arc<dyn Authorizer>, slug: impl Into<String>) -> Self {
        Self::new(authorizer, Requirement::Role(slug.into()))
    }

    /// Require any one of the roles
    pub fn any_role(authorizer: Arc<dyn Authorizer>, slugs: Vec<String>) -> Self {
        Self::new(authorizer, Requirement::AnyRole(slugs))
    }

    /// Require one of the configured administrator roles
    pub fn admin(authorizer: Arc<dyn Authorizer>, config: &RbacConfig) -> Self {
        Self::any_role(authorizer, config.admin_role_slugs.clone())
    }

    /// Require the super administrator role
    pub fn super_admin(authorizer: Arc<dyn Authorizer>, config: &RbacConfig) -> Self {
        Self::role(authorizer, config.super_admin_slug.clone())
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// Decide a request: 401 without an authenticated caller, 403 when the
    /// requirement is not met, 500 when the check itself fails.
    pub async fn authorize(&self, context: Option<AuthContext>) -> Result<(), StatusCode> {
        let context = context.ok_or(StatusCode::UNAUTHORIZED)?;
        let user_id = context.user_id;

        let allowed = match &self.requirement {
            Requirement::Permission { resource, action } => {
                self.authorizer
                    .check_user_permission(user_id, resource, action)
                    .await
            }
            Requirement::AnyPermission(permissions) => {
                self.authorizer
                    .check_user_any_permission(user_id, permissions)
                    .await
            }
            Requirement::Role(slug) => self.authorizer.check_user_role(user_id, slug).await,
            Requirement::AnyRole(slugs) => self.authorizer.check_user_any_role(user_id, slugs).await,
        }
        .map_err(|e| {
            error!(%user_id, error = %e, "Authorization check failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        if !allowed {
            warn!(%user_id, requirement = ?self.requirement, "Access denied");
            return Err(StatusCode::FORBIDDEN);
        }

        debug!(%user_id, requirement = ?self.requirement, "Access granted");
        Ok(())
    }

    /// Middleware function for route-level authorization
    pub async fn enforce(
        State(guard): State<Arc<RbacGuard>>,
        request: Request<Body>,
        next: Next,
    ) -> Result<Response, StatusCode> {
        let context = AuthContext::from_extensions(request.extensions());
        guard.authorize(context).await?;

        Ok(next.run(request).await)
    }
}
