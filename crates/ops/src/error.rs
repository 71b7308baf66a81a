//! Errors raised by content, mark, and range operations.

use docstore_schema::SchemaError;
use docstore_store::StoreError;
use docstore_types::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpsError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("split position {0} is not strictly interior to the block's children")]
    InvalidSplitPosition(usize),

    #[error("block {0} and block {1} have different node types")]
    TypeMismatch(NodeId, NodeId),

    #[error("block {0} and block {1} are not siblings under the same parent")]
    NotSiblings(NodeId, NodeId),

    #[error("range references a non-text node or out-of-bounds offsets")]
    InvalidRange,

    #[error("alias {0:?} is used more than once in the same template")]
    DuplicateAlias(String),
}
