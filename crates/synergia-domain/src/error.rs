//! Domain error types.

use synergia_store::StoreError;
use thiserror::Error;

/// Domain-level errors.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Entity does not exist or is not visible to the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input violates a business rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation clashes with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage failure.
    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => DomainError::NotFound(what),
            other => DomainError::Store(other),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
