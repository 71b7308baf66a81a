//! Facade-level errors: `TemplateError` (C9) and `DataStoreError`, which unifies
//! every crate boundary's error enum behind the public API.

use docstore_ops::OpsError;
use docstore_schema::SchemaError;
use docstore_store::StoreError;
use docstore_traversal::TraversalError;
use thiserror::Error;

/// Errors raised by [`crate::create_node_with_children`] (C9).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("alias {0:?} is used more than once in the same template")]
    DuplicateAlias(String),
}

/// Every error the [`crate::DataStore`] facade can return, composed from its
/// layers' own error enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataStoreError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ops(#[from] OpsError),

    #[error(transparent)]
    Traversal(#[from] TraversalError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("this operation requires a schema, but the store was constructed without one")]
    NoSchema,
}
