//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, caller/input failures (validation,
/// lifecycle guards, conflicts). None of these are transient, so nothing in the
/// service layer retries them. Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Unknown field, operator/type mismatch, malformed payload or value.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier has no matching entity.
    #[error("{0}")]
    NotFound(String),

    /// The deleted-state guard was violated (mutating a deleted entity, or
    /// restoring one that is not deleted).
    #[error("{0}")]
    SoftDeletion(String),

    /// The sold-state guard was violated.
    #[error("{0}")]
    Selling(String),

    /// A uniqueness or concurrency conflict (duplicate login, stale version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The acting user may not perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn soft_deletion(msg: impl Into<String>) -> Self {
        Self::SoftDeletion(msg.into())
    }

    pub fn selling(msg: impl Into<String>) -> Self {
        Self::Selling(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
}
