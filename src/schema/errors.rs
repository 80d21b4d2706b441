//! # Schema Errors
//!
//! Error types for schema construction, preparation, and presentation.
//!
//! All schema-level errors are decided locally, before any store request
//! is issued.

use serde_json::Value;
use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised by the field-type engine and schema composition
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    /// A field listed as required is absent (or null) in the document
    #[error("required field '{field}' is not set")]
    RequiredFieldMissing { field: String },

    /// The document references a field the schema does not declare
    #[error("undeclared document attribute '{field}'")]
    UndeclaredField { field: String },

    /// A validator predicate rejected a value
    #[error("field '{field}' failed {label} validation with value: {value}")]
    Validation {
        field: String,
        label: String,
        value: Value,
    },

    /// The declared type name is not one of the supported field types
    #[error("unsupported schema type '{type_name}' for field '{field}'")]
    UnsupportedType { field: String, type_name: String },
}

impl SchemaError {
    /// Returns the field path the error refers to
    pub fn field(&self) -> &str {
        match self {
            SchemaError::RequiredFieldMissing { field }
            | SchemaError::UndeclaredField { field }
            | SchemaError::Validation { field, .. }
            | SchemaError::UnsupportedType { field, .. } => field,
        }
    }
}
