//! Unified error type for domain operations.

use thiserror::Error;

/// Errors raised by domain mutations and invariant checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g. empty nickname, out-of-range value)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Business rule violation (e.g. joining a room twice)
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Entity not found inside an aggregate
    #[error("not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
