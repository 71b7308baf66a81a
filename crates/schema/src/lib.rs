//! The schema layer: node/mark type registry, content expressions, validation.

mod content_expr;
mod error;
mod schema;

pub use content_expr::{ContentExpr, ContentExprParseError, Quantifier};
pub use error::SchemaError;
pub use schema::{AttrSpec, MarkTypeDef, NodeTypeDef, Schema, SchemaBuilder};
