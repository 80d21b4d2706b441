//! # Model Errors
//!
//! Error types for the document-lifecycle layer. Schema-level failures are
//! decided before any store request; store-level failures pass through
//! verbatim inside `Store`.

use thiserror::Error;

use crate::schema::SchemaError;
use crate::store::StoreError;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by document lifecycle operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    /// A schema-level failure (required/undeclared/validation), decided
    /// locally before any store contact
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The declared hash field is not present in the schema
    #[error("hash field '{field}' is not declared in model '{model}'")]
    MissingHashField { model: String, field: String },

    /// The declared range field is not present in the schema
    #[error("key field '{field}' is not declared in model '{model}'")]
    MissingKeyField { model: String, field: String },

    /// An array-typed field was used as a key component
    #[error("field '{field}' of type {type_name} cannot be used as a key")]
    UnsupportedKeyType { field: String, type_name: String },

    /// The same field was named by more than one update group
    #[error("field '{field}' appears in more than one update group")]
    ConflictingUpdate { field: String },

    /// An opaque store-side failure, relayed unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ModelError {
    /// Whether this wraps the store's recoverable conditional-check
    /// failure: the documented way `insert` signals "already exists" and
    /// `update` signals "precondition not met".
    pub fn is_conditional_check_failed(&self) -> bool {
        matches!(self, ModelError::Store(e) if e.is_conditional_check_failed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_errors_convert() {
        let err: ModelError = SchemaError::RequiredFieldMissing { field: "id".into() }.into();
        assert!(matches!(err, ModelError::Schema(_)));
    }

    #[test]
    fn test_conditional_check_recognition() {
        let err: ModelError = StoreError::conditional_check_failed("exists").into();
        assert!(err.is_conditional_check_failed());

        let err = ModelError::ConflictingUpdate { field: "n".into() };
        assert!(!err.is_conditional_check_failed());
    }
}
