//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure a store operation can surface maps to exactly one of these
/// kinds. Storage failures that are not a recognised constraint violation are
/// carried unchanged in [`DomainError::Storage`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, unknown reference).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The entity is absent, or present with the wrong role.
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness rule was violated (category name, product SKU).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unexpected storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// Failure reported by a persistence backend.
///
/// Constraint violations are kept distinct from other failures so that the
/// stores can translate them into domain errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A foreign key constraint rejected the write.
    #[error("foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// Any other backend failure (connection, decoding, check constraints, ...).
    #[error("storage failure in {operation}: {message}")]
    Backend { operation: String, message: String },
}

impl StorageError {
    pub fn unique(constraint: impl Into<String>) -> Self {
        Self::UniqueViolation {
            constraint: constraint.into(),
        }
    }

    pub fn foreign_key(constraint: impl Into<String>) -> Self {
        Self::ForeignKeyViolation {
            constraint: constraint.into(),
        }
    }

    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, Self::ForeignKeyViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_converts_into_domain_error_unchanged() {
        let storage = StorageError::backend("insert_product", "connection reset");
        let err: DomainError = storage.clone().into();
        assert_eq!(err, DomainError::Storage(storage));
        assert_eq!(
            err.to_string(),
            "storage failure in insert_product: connection reset"
        );
    }

    #[test]
    fn constraint_kinds_are_distinguishable() {
        assert!(StorageError::unique("products_sku_key").is_unique_violation());
        assert!(!StorageError::unique("products_sku_key").is_foreign_key_violation());
        assert!(StorageError::foreign_key("products_category_id_fkey").is_foreign_key_violation());
        assert!(!StorageError::backend("op", "boom").is_unique_violation());
    }

    #[test]
    fn not_found_message_names_the_entity() {
        assert_eq!(
            DomainError::not_found("variant 7").to_string(),
            "variant 7 not found"
        );
    }
}
