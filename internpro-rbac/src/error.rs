//! Error types for RBAC operations

use axum::http::StatusCode;
use internpro_storage::DatabaseError;
use thiserror::Error;
use uuid::Uuid;

/// Result type for RBAC operations
pub type RbacResult<T> = Result<T, RbacError>;

/// RBAC-specific errors
#[derive(Error, Debug)]
pub enum RbacError {
    /// Referenced record does not exist or has been soft-deleted
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Unique slug or name already taken by a live record
    #[error("{message}")]
    Conflict { message: String },

    /// Malformed input
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Persistence failure, tagged with the operation that issued it
    #[error("Failed to {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: DatabaseError,
    },

    /// Operation exceeded the configured deadline
    #[error("Operation timed out: {operation}")]
    Timeout { operation: &'static str },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RbacError {
    /// Create a new not found error
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a new conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Wrap a storage error. Unique index violations become conflicts so a
    /// lost race on insert reads the same as a failed slug check.
    pub fn storage(operation: &'static str, source: DatabaseError) -> Self {
        match source {
            DatabaseError::Conflict(_) => Self::Conflict {
                message: format!("Failed to {}: a record with the same unique value already exists", operation),
            },
            source => Self::Storage { operation, source },
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// HTTP status the delivery layer should answer with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Storage { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Shorthand for the ids carried by not-found errors
pub(crate) fn missing(entity: &'static str, id: Uuid) -> RbacError {
    RbacError::not_found(entity, id)
}
