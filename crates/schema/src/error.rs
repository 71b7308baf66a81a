//! Schema validation errors.

use thiserror::Error;

/// Errors raised while validating a template or node instance against a [`crate::Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// One or more validation rules failed. Carries every violation found, not
    /// just the first, so callers can surface a complete diagnostic.
    #[error("schema validation failed: {}", .0.join("; "))]
    Invalid(Vec<String>),

    /// A node/template referenced a type name the schema does not define.
    #[error("unknown node type {0:?}")]
    UnknownNodeType(String),

    /// A mark referenced a type name the schema does not define.
    #[error("unknown mark type {0:?}")]
    UnknownMarkType(String),
}
