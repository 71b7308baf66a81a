//! C3: the copy-on-write transaction overlay.
//!
//! Grounded directly on the teacher's `OverlayTreeStore<'a>`: a struct that
//! borrows the base store and captures every write in its own maps, so the
//! base is left untouched until the caller explicitly applies the capture.
//! Reads check the overlay first, then fall through to the base.

use crate::error::StoreError;
use crate::mutable_store::MutableStore;
use crate::node_store::NodeStore;
use crate::op_buffer::OpBuffer;
use docstore_types::{INode, NodeId, NodePatch, Operation};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// One shadow write: either a brand-new node (not yet in the base store) or
/// a partial patch against a node the base store already has.
#[derive(Debug, Clone)]
pub enum OverlayEntry {
    Full(INode),
    Patch(NodePatch),
}

/// Transaction-scoped shadow state: staged writes, deletion tombstones, and
/// the alias table. Carries no reference to the base store itself — that is
/// supplied per-call by [`Overlay::view`], so the overlay can be constructed
/// and torn down independently of the store's borrow.
#[derive(Debug, Default)]
pub struct Overlay {
    updates: IndexMap<NodeId, OverlayEntry>,
    tombstones: HashSet<NodeId>,
    alias_table: HashMap<String, NodeId>,
    buffer: OpBuffer,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow `base` for the duration of one call and return a read/write view.
    pub fn view<'a>(&'a mut self, base: &'a NodeStore) -> OverlayView<'a> {
        OverlayView { base, overlay: self }
    }

    pub fn resolve_alias(&self, name: &str) -> NodeId {
        self.alias_table
            .get(name)
            .cloned()
            .unwrap_or_else(|| NodeId::new(name))
    }

    pub fn set_alias(&mut self, name: String, id: NodeId) {
        self.alias_table.insert(name, id);
    }

    /// Drain the ops accumulated so far (used at commit time).
    pub fn take_ops(&mut self) -> Vec<Operation> {
        self.buffer.drain()
    }

    /// Consume the overlay, handing back its staged writes and tombstones for
    /// [`NodeStore::commit_overlay`] to apply.
    pub fn into_parts(self) -> (IndexMap<NodeId, OverlayEntry>, HashSet<NodeId>) {
        (self.updates, self.tombstones)
    }

    fn get_merged(&self, base: &NodeStore, id: &NodeId) -> Option<INode> {
        if self.tombstones.contains(id) {
            return None;
        }
        match self.updates.get(id) {
            Some(OverlayEntry::Full(node)) => Some(node.clone()),
            Some(OverlayEntry::Patch(patch)) => {
                let mut node = base.get_node(id)?;
                node.apply_patch(patch);
                Some(node)
            }
            None => base.get_node(id),
        }
    }

    fn stage_create(&mut self, node: INode) {
        self.tombstones.remove(&node.sid);
        self.updates.insert(node.sid.clone(), OverlayEntry::Full(node));
    }

    fn stage_patch(&mut self, id: NodeId, patch: NodePatch) {
        match self.updates.get_mut(&id) {
            Some(OverlayEntry::Full(node)) => node.apply_patch(&patch),
            Some(OverlayEntry::Patch(existing)) => existing.merge(&patch),
            None => {
                self.updates.insert(id, OverlayEntry::Patch(patch));
            }
        }
    }

    fn stage_delete(&mut self, id: NodeId) {
        self.updates.shift_remove(&id);
        self.tombstones.insert(id);
    }
}

/// A read/write view combining a borrowed base store with a borrowed overlay.
/// All writes land only in the overlay; the base is never touched.
pub struct OverlayView<'a> {
    base: &'a NodeStore,
    overlay: &'a mut Overlay,
}

impl<'a> MutableStore for OverlayView<'a> {
    fn get(&self, id: &NodeId) -> Option<INode> {
        self.overlay.get_merged(self.base, id)
    }

    fn next_id(&self) -> NodeId {
        self.base.next_id()
    }

    fn root_id(&self) -> Option<NodeId> {
        self.all_nodes().into_iter().find(|n| n.is_root()).map(|n| n.sid)
    }

    fn all_nodes(&self) -> Vec<INode> {
        let mut result = Vec::new();
        for node in self.base.get_all_nodes() {
            if self.overlay.tombstones.contains(&node.sid) {
                continue;
            }
            match self.overlay.updates.get(&node.sid) {
                Some(OverlayEntry::Full(node)) => result.push(node.clone()),
                Some(OverlayEntry::Patch(patch)) => {
                    let mut node = node;
                    node.apply_patch(patch);
                    result.push(node);
                }
                None => result.push(node),
            }
        }
        for (id, entry) in self.overlay.updates.iter() {
            if self.base.get_node(id).is_some() {
                continue;
            }
            if let OverlayEntry::Full(node) = entry {
                result.push(node.clone());
            }
        }
        result
    }

    fn create(&mut self, node: INode) -> Result<(), StoreError> {
        if self.get(&node.sid).is_some() {
            return Err(StoreError::DuplicateId(node.sid));
        }
        if node.is_root() {
            if let Some(existing_root) = self.root_id() {
                tracing::warn!(new_root_candidate = %node.sid, %existing_root, "second root node created inside transaction; existing root preserved");
            }
        }
        self.overlay.buffer.push(Operation::Create {
            node_id: node.sid.clone(),
            data: node.clone(),
        });
        self.overlay.stage_create(node);
        Ok(())
    }

    fn update(&mut self, id: &NodeId, patch: NodePatch) {
        if patch.is_empty() {
            return;
        }
        let Some(current) = self.get(id) else {
            tracing::warn!(node_id = %id, "update on missing node ignored");
            return;
        };
        let mut patched = current.clone();
        patched.apply_patch(&patch);
        if patched == current {
            return;
        }
        self.overlay.buffer.push(Operation::Update {
            node_id: id.clone(),
            data: patch.clone(),
        });
        self.overlay.stage_patch(id.clone(), patch);
    }

    fn apply_patch_silently(&mut self, id: &NodeId, patch: NodePatch) {
        self.overlay.stage_patch(id.clone(), patch);
    }

    fn delete(&mut self, id: &NodeId) {
        if self.get(id).is_none() {
            return;
        }
        self.overlay.buffer.push(Operation::Delete { node_id: id.clone() });
        self.overlay.stage_delete(id.clone());
    }

    fn emit_move(&mut self, node_id: NodeId, parent_id: NodeId, position: usize) {
        self.overlay.buffer.push(Operation::Move {
            node_id,
            parent_id,
            position,
        });
    }

    fn resolve_alias(&self, name: &str) -> NodeId {
        self.overlay.resolve_alias(name)
    }

    fn set_alias(&mut self, name: String, id: NodeId) {
        self.overlay.set_alias(name, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_types::INode;

    #[test]
    fn reads_fall_through_to_base() {
        let mut base = NodeStore::new(1);
        base.set_node(INode::new(NodeId::new("1:0"), "doc"), false).unwrap();
        let mut overlay = Overlay::new();
        let view = overlay.view(&base);
        assert!(view.get(&NodeId::new("1:0")).is_some());
    }

    #[test]
    fn writes_stay_in_overlay_until_committed() {
        let mut base = NodeStore::new(1);
        base.set_node(INode::new(NodeId::new("1:0"), "doc"), false).unwrap();
        let mut overlay = Overlay::new();
        {
            let mut view = overlay.view(&base);
            view.update(&NodeId::new("1:0"), NodePatch::with_text(Some("hi".into())));
        }
        assert!(base.get_node(&NodeId::new("1:0")).unwrap().text.is_none());
        let (updates, _) = overlay.into_parts();
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn tombstoned_node_reads_as_none() {
        let mut base = NodeStore::new(1);
        base.set_node(INode::new(NodeId::new("1:0"), "doc"), false).unwrap();
        let mut overlay = Overlay::new();
        {
            let mut view = overlay.view(&base);
            view.delete(&NodeId::new("1:0"));
        }
        let view = overlay.view(&base);
        assert!(view.get(&NodeId::new("1:0")).is_none());
        assert!(base.get_node(&NodeId::new("1:0")).is_some(), "base untouched before commit");
    }

    #[test]
    fn alias_resolves_to_registered_id_else_passthrough() {
        let mut overlay = Overlay::new();
        overlay.set_alias("x".into(), NodeId::new("1:5"));
        assert_eq!(overlay.resolve_alias("x"), NodeId::new("1:5"));
        assert_eq!(overlay.resolve_alias("1:7"), NodeId::new("1:7"));
    }
}
