//! The canonical, wire-shaped atomic operation emitted by every mutation.

use crate::ids::NodeId;
use crate::node::{INode, NodePatch};
use serde::{Deserialize, Serialize};

/// One atomic, replayable mutation. No coalescing: a transaction's op stream
/// is preserved exactly as produced so collaboration adapters can replay it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    Create { node_id: NodeId, data: INode },
    Update { node_id: NodeId, data: NodePatch },
    Move { node_id: NodeId, parent_id: NodeId, position: usize },
    Delete { node_id: NodeId },
}

impl Operation {
    /// The id of the node this operation targets.
    pub fn node_id(&self) -> &NodeId {
        match self {
            Operation::Create { node_id, .. }
            | Operation::Update { node_id, .. }
            | Operation::Move { node_id, .. }
            | Operation::Delete { node_id, .. } => node_id,
        }
    }
}
