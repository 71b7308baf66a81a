//! The `MutableStore` trait: the single abstraction `ContentOps`/`MarkOps`/
//! `RangeOps` are written against, so they behave identically whether or not
//! a transaction is active.
//!
//! This closes the gap the distilled spec's design notes flag: there is no
//! code path left where a mutation can reach the base store directly while a
//! transaction holds the overlay (see `SPEC_FULL.md`'s REDESIGN FLAGS §1).

use docstore_types::{INode, NodeId, NodePatch, Operation};

/// Read/write surface over either the base [`crate::NodeStore`] (immediate
/// mode) or an [`crate::OverlayView`] (transactional mode).
pub trait MutableStore {
    /// Read a node's current value (merged with any pending overlay writes).
    fn get(&self, id: &NodeId) -> Option<INode>;

    /// Allocate a fresh id from the underlying store's session allocator.
    fn next_id(&self) -> NodeId;

    /// The current root node's id, if one exists.
    fn root_id(&self) -> Option<NodeId>;

    /// A full, order-preserving snapshot of every live node.
    fn all_nodes(&self) -> Vec<INode>;

    /// Stage the creation of a brand-new node. Emits `Operation::Create`.
    fn create(&mut self, node: INode) -> Result<(), crate::StoreError>;

    /// Stage a partial update. Emits `Operation::Update` only if `patch`
    /// causes an observable change relative to the node's current value.
    fn update(&mut self, id: &NodeId, patch: NodePatch);

    /// Apply a patch without emitting any op. Used by higher-level ops that
    /// already emit their own canonical op for the whole mutation (e.g. a
    /// `move` op covers both the parent content-array edit and the moved
    /// node's `parent_id` change — neither should also surface as an update).
    fn apply_patch_silently(&mut self, id: &NodeId, patch: NodePatch);

    /// Stage the deletion of a node. Emits `Operation::Delete`.
    fn delete(&mut self, id: &NodeId);

    /// Emit a `Operation::Move` directly — callers have already updated
    /// `content`/`parent_id` via [`MutableStore::update`] on the affected nodes.
    fn emit_move(&mut self, node_id: NodeId, parent_id: NodeId, position: usize);

    /// Resolve an alias to a concrete id. Concrete ids pass through unchanged.
    fn resolve_alias(&self, name: &str) -> NodeId;

    /// Register `name` as an alias for `id`. A no-op in immediate mode, since
    /// aliases are transaction-scoped (spec §4.9 / Design Notes).
    fn set_alias(&mut self, name: String, id: NodeId);

    /// Find every live node of a given type, in document-insertion order.
    fn find_by_type(&self, stype: &str) -> Vec<INode> {
        self.all_nodes()
            .into_iter()
            .filter(|n| n.stype == stype)
            .collect()
    }
}
