//! Store-level errors.

use docstore_types::NodeId;
use thiserror::Error;

/// Errors raised by the node store and its transactional overlay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("node {0} already exists")]
    DuplicateId(NodeId),

    #[error("a transaction is already active")]
    TransactionAlreadyActive,
}
