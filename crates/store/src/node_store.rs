//! C2: the flat node store — the map every read eventually bottoms out in.

use crate::error::StoreError;
use crate::mutable_store::MutableStore;
use crate::op_buffer::OpBuffer;
use docstore_types::{IdAllocator, INode, NodeId, NodePatch, Operation};
use indexmap::IndexMap;

/// The flat `sid -> INode` map, with root tracking and id allocation.
///
/// Backed by an [`IndexMap`] rather than a `HashMap` so that
/// [`NodeStore::get_all_nodes`]/[`NodeStore::find_nodes_by_type`] iterate in
/// a deterministic, insertion-preserving order.
#[derive(Debug)]
pub struct NodeStore {
    nodes: IndexMap<NodeId, INode>,
    root: Option<NodeId>,
    allocator: IdAllocator,
    pending_ops: OpBuffer,
}

impl NodeStore {
    pub fn new(session: u64) -> Self {
        Self {
            nodes: IndexMap::new(),
            root: None,
            allocator: IdAllocator::new(session),
            pending_ops: OpBuffer::new(),
        }
    }

    /// Allocate the next id this store will hand out.
    pub fn next_id(&self) -> NodeId {
        self.allocator.next()
    }

    pub fn get_node(&self, id: &NodeId) -> Option<INode> {
        self.nodes.get(id).cloned()
    }

    /// Insert or overwrite a node directly. `emit = false` is for bulk
    /// seeding (no op is appended, per spec §4.2).
    pub fn set_node(&mut self, node: INode, emit: bool) -> Result<(), StoreError> {
        if self.nodes.contains_key(&node.sid) {
            return Err(StoreError::DuplicateId(node.sid));
        }
        self.link_root(&node);
        let sid = node.sid.clone();
        if emit {
            self.pending_ops.push(Operation::Create {
                node_id: sid.clone(),
                data: node.clone(),
            });
        }
        self.nodes.insert(sid, node);
        Ok(())
    }

    pub fn delete_node(&mut self, id: &NodeId) -> Option<INode> {
        let removed = self.nodes.shift_remove(id);
        if removed.is_some() && self.root.as_ref() == Some(id) {
            self.root = None;
        }
        removed
    }

    pub fn get_all_nodes(&self) -> Vec<INode> {
        self.nodes.values().cloned().collect()
    }

    pub fn get_root_node(&self) -> Option<INode> {
        self.root.as_ref().and_then(|id| self.nodes.get(id)).cloned()
    }

    pub fn find_nodes_by_type(&self, stype: &str) -> Vec<INode> {
        self.nodes.values().filter(|n| n.stype == stype).cloned().collect()
    }

    /// Drain ops accumulated by immediate-mode mutations (via [`MutableStore`]).
    pub fn take_pending_ops(&mut self) -> Vec<Operation> {
        self.pending_ops.drain()
    }

    /// Apply a committed overlay's staged writes directly to the base map.
    /// No ops are emitted here — they were already collected by the overlay's
    /// own buffer over the life of the transaction.
    pub fn commit_overlay(
        &mut self,
        updates: IndexMap<NodeId, crate::overlay::OverlayEntry>,
        tombstones: std::collections::HashSet<NodeId>,
    ) {
        use crate::overlay::OverlayEntry;
        for (id, entry) in updates {
            match entry {
                OverlayEntry::Full(node) => {
                    self.link_root(&node);
                    self.nodes.insert(id, node);
                }
                OverlayEntry::Patch(patch) => {
                    if let Some(existing) = self.nodes.get_mut(&id) {
                        existing.apply_patch(&patch);
                    }
                }
            }
        }
        for id in tombstones {
            self.delete_node(&id);
        }
    }

    fn link_root(&mut self, node: &INode) {
        if !node.is_root() {
            return;
        }
        if self.root.is_none() {
            self.root = Some(node.sid.clone());
        } else {
            // Second root-type creation: preserve the first root, the new
            // node is inserted as a non-root orphan (spec §4.2, REDESIGN §2).
            tracing::warn!(new_root_candidate = %node.sid, existing_root = ?self.root, "second root node created; existing root preserved");
        }
    }
}

impl MutableStore for NodeStore {
    fn get(&self, id: &NodeId) -> Option<INode> {
        self.get_node(id)
    }

    fn next_id(&self) -> NodeId {
        self.allocator.next()
    }

    fn root_id(&self) -> Option<NodeId> {
        self.root.clone()
    }

    fn all_nodes(&self) -> Vec<INode> {
        self.get_all_nodes()
    }

    fn create(&mut self, node: INode) -> Result<(), StoreError> {
        self.set_node(node, true)
    }

    fn update(&mut self, id: &NodeId, patch: NodePatch) {
        let Some(current) = self.nodes.get(id) else {
            tracing::warn!(node_id = %id, "update on missing node ignored");
            return;
        };
        if patch.is_empty() {
            return;
        }
        let mut patched = current.clone();
        patched.apply_patch(&patch);
        if &patched == current {
            return;
        }
        self.nodes.insert(id.clone(), patched);
        self.pending_ops.push(Operation::Update {
            node_id: id.clone(),
            data: patch,
        });
    }

    fn apply_patch_silently(&mut self, id: &NodeId, patch: NodePatch) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.apply_patch(&patch);
        }
    }

    fn delete(&mut self, id: &NodeId) {
        if self.delete_node(id).is_some() {
            self.pending_ops.push(Operation::Delete { node_id: id.clone() });
        }
    }

    fn emit_move(&mut self, node_id: NodeId, parent_id: NodeId, position: usize) {
        self.pending_ops.push(Operation::Move {
            node_id,
            parent_id,
            position,
        });
    }

    fn resolve_alias(&self, name: &str) -> NodeId {
        NodeId::new(name)
    }

    fn set_alias(&mut self, _name: String, _id: NodeId) {
        // Aliases are transaction-scoped; immediate mode has no transaction.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_types::INode;
    use tracing_test::traced_test;

    #[test]
    fn duplicate_id_fails() {
        let mut store = NodeStore::new(1);
        let node = INode::new(NodeId::new("1:0"), "doc");
        store.set_node(node.clone(), true).unwrap();
        let err = store.set_node(node, true).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(_)));
    }

    #[test]
    fn second_root_becomes_orphan_not_root() {
        let mut store = NodeStore::new(1);
        let first = INode::new(NodeId::new("1:0"), "doc");
        let second = INode::new(NodeId::new("1:1"), "doc");
        store.set_node(first.clone(), true).unwrap();
        store.set_node(second, true).unwrap();
        assert_eq!(store.get_root_node().unwrap().sid, first.sid);
        assert_eq!(store.get_all_nodes().len(), 2, "orphan is still stored");
    }

    #[traced_test]
    #[test]
    fn second_root_creation_logs_a_warning() {
        let mut store = NodeStore::new(1);
        let first = INode::new(NodeId::new("1:0"), "doc");
        let second = INode::new(NodeId::new("1:1"), "doc");
        store.set_node(first, true).unwrap();
        store.set_node(second, true).unwrap();
        assert!(logs_contain("second root node created"));
    }

    #[test]
    fn update_skips_op_when_patch_is_a_no_op() {
        let mut store = NodeStore::new(1);
        let mut node = INode::new(NodeId::new("1:0"), "paragraph");
        node.text = Some("hi".into());
        store.create(node).unwrap();
        store.take_pending_ops();

        store.update(&NodeId::new("1:0"), NodePatch::with_text(Some("hi".into())));
        assert!(store.take_pending_ops().is_empty());

        store.update(&NodeId::new("1:0"), NodePatch::with_text(Some("bye".into())));
        assert_eq!(store.take_pending_ops().len(), 1);
    }

    #[test]
    fn set_node_with_emit_false_appends_no_op() {
        let mut store = NodeStore::new(1);
        store.set_node(INode::new(NodeId::new("1:0"), "doc"), false).unwrap();
        assert!(store.take_pending_ops().is_empty());
    }

    #[test]
    fn commit_overlay_applies_creates_patches_and_deletes() {
        use crate::mutable_store::MutableStore;
        use crate::overlay::Overlay;

        let mut store = NodeStore::new(1);
        store.set_node(INode::new(NodeId::new("1:0"), "doc"), false).unwrap();
        let mut node = INode::new(NodeId::new("1:1"), "paragraph");
        node.parent_id = Some(NodeId::new("1:0"));
        node.text = Some("hi".into());
        store.set_node(node, false).unwrap();

        let mut overlay = Overlay::new();
        {
            let mut view = overlay.view(&store);
            view.update(&NodeId::new("1:1"), NodePatch::with_text(Some("bye".into())));
            view.delete(&NodeId::new("1:1"));
            let mut created = INode::new(NodeId::new("1:2"), "paragraph");
            created.parent_id = Some(NodeId::new("1:0"));
            view.create(created).unwrap();
        }
        let (updates, tombstones) = overlay.into_parts();
        store.commit_overlay(updates, tombstones);

        assert!(store.get_node(&NodeId::new("1:1")).is_none());
        assert!(store.get_node(&NodeId::new("1:2")).is_some());
    }
}
