//! Errors raised by document-order traversal.

use docstore_types::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
}
