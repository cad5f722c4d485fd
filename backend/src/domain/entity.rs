//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all domain entities.
//! All entities must have a unique ID and be thread-safe.

use thiserror::Error;

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Copy + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization conflict or deadlock reported by storage. Retryable.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Terminal failure of a transaction, after `attempts` tries.
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    Transaction {
        operation: String,
        attempts: u32,
        source: Box<DomainError>,
    },
}

impl DomainError {
    /// Whether retrying the enclosing transaction may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Conflict(_))
    }

    /// Whether this error was produced after the retry layer gave up
    pub fn is_terminal(&self) -> bool {
        matches!(self, DomainError::Transaction { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), DomainError::NotFound(_))
    }

    /// The underlying error with transaction context stripped
    pub fn root_cause(&self) -> &DomainError {
        match self {
            DomainError::Transaction { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_transaction_context() {
        let err = DomainError::Transaction {
            operation: "move item".to_string(),
            attempts: 4,
            source: Box::new(DomainError::Conflict("database is locked".to_string())),
        };

        assert!(err.is_terminal());
        assert!(!err.is_retryable());
        assert!(err.root_cause().is_retryable());
        assert_eq!(
            err.to_string(),
            "move item failed after 4 attempt(s): Conflict: database is locked"
        );
    }

    #[test]
    fn test_not_found_survives_wrapping() {
        let err = DomainError::Transaction {
            operation: "toggle item".to_string(),
            attempts: 1,
            source: Box::new(DomainError::NotFound("Item 3".to_string())),
        };
        assert!(err.is_not_found());
        assert!(!DomainError::Storage("disk I/O error".to_string()).is_not_found());
    }
}
