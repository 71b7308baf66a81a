//! The `DataStore` facade: the single public entry point composing the
//! schema/store/ops/traversal layers and the subscriber/adapter machinery
//! from §5–§6.

use crate::adapter::{DetachGuard, OperationHandler, SubscriptionId};
use crate::error::DataStoreError;
use crate::template_builder;
use docstore_ops::{ContentOps, MarkOps, ModelSelection};
use docstore_schema::Schema;
use docstore_store::{MutableStore, NodeStore, Overlay, StoreError};
use docstore_traversal::{Traversal, TraversalOptions};
use docstore_types::{INode, Mark, NodeId, NodePatch, NodeTemplate, Operation, Range};
use indexmap::IndexMap;
use std::rc::Rc;

/// The in-memory document core: a flat node store, an optional active
/// transaction overlay, and the subscriber list collaboration adapters hook
/// into. Constructed once per editing session.
pub struct DataStore {
    store: NodeStore,
    schema: Option<Rc<Schema>>,
    overlay: Option<Overlay>,
    subscribers: IndexMap<SubscriptionId, OperationHandler>,
    next_subscription_id: SubscriptionId,
    in_notification: bool,
}

impl DataStore {
    pub fn new(session: u64, schema: Option<Schema>) -> Self {
        Self {
            store: NodeStore::new(session),
            schema: schema.map(Rc::new),
            overlay: None,
            subscribers: IndexMap::new(),
            next_subscription_id: 0,
            in_notification: false,
        }
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_deref()
    }

    fn require_schema(&self) -> Result<Rc<Schema>, DataStoreError> {
        self.schema.clone().ok_or(DataStoreError::NoSchema)
    }

    /// Run `f` against whichever store is live: the overlay view if a
    /// transaction is active, else the base store directly.
    fn mutate<R>(&mut self, f: impl FnOnce(&mut dyn MutableStore) -> R) -> R {
        if let Some(overlay) = self.overlay.as_mut() {
            let mut view = overlay.view(&self.store);
            f(&mut view)
        } else {
            let result = f(&mut self.store);
            let ops = self.store.take_pending_ops();
            self.notify(&ops);
            result
        }
    }

    /// Read-only counterpart of [`DataStore::mutate`]. Still takes `&mut
    /// self` because [`Overlay::view`] borrows the overlay mutably even
    /// though the access pattern here never writes through it.
    fn read<R>(&mut self, f: impl FnOnce(&dyn MutableStore) -> R) -> R {
        if let Some(overlay) = self.overlay.as_mut() {
            let view = overlay.view(&self.store);
            f(&view)
        } else {
            f(&self.store)
        }
    }

    fn notify(&mut self, ops: &[Operation]) {
        if ops.is_empty() {
            return;
        }
        debug_assert!(!self.in_notification, "re-entrant mutation from within an on_operation subscriber");
        self.in_notification = true;
        for op in ops {
            for handler in self.subscribers.values_mut() {
                handler(op);
            }
        }
        self.in_notification = false;
    }

    // ---- §5 transaction lifecycle -----------------------------------------

    /// Begin a transaction. Errors if one is already active.
    pub fn begin(&mut self) -> Result<(), DataStoreError> {
        if self.overlay.is_some() {
            return Err(StoreError::TransactionAlreadyActive.into());
        }
        tracing::debug!("transaction begun");
        self.overlay = Some(Overlay::new());
        Ok(())
    }

    /// Apply the active transaction's staged writes to the base store and
    /// notify subscribers with its full op list, in emission order. A no-op
    /// (returns an empty list) if no transaction is active.
    pub fn commit(&mut self) -> Result<Vec<Operation>, DataStoreError> {
        let Some(mut overlay) = self.overlay.take() else {
            return Ok(Vec::new());
        };
        let ops = overlay.take_ops();
        let (updates, tombstones) = overlay.into_parts();
        self.store.commit_overlay(updates, tombstones);
        tracing::debug!(op_count = ops.len(), "transaction committed");
        self.notify(&ops);
        Ok(ops)
    }

    /// Discard the active transaction's overlay; the base store is left
    /// exactly as it was before `begin()`. A no-op if none is active.
    pub fn rollback(&mut self) {
        if self.overlay.take().is_some() {
            tracing::debug!("transaction rolled back");
        }
    }

    /// Close the active transaction without committing it. Alias for
    /// [`DataStore::rollback`] — distinct only in intent, not behavior.
    pub fn end(&mut self) {
        self.rollback();
    }

    // ---- subscribers / adapters --------------------------------------------

    pub fn on_operation(&mut self, handler: OperationHandler) -> SubscriptionId {
        let id = self.next_subscription_id;
        self.next_subscription_id += 1;
        self.subscribers.insert(id, handler);
        id
    }

    pub fn off_operation(&mut self, id: SubscriptionId) {
        self.subscribers.shift_remove(&id);
    }

    /// Detach `id`'s subscription for the scope of the returned guard,
    /// re-attaching it on drop. Used by [`crate::CollaborationAdapter::receive_operation`]
    /// implementations to apply a remote op without echoing it back to themselves.
    pub fn detach(&mut self, id: SubscriptionId) -> DetachGuard<'_> {
        let handler = self.subscribers.shift_remove(&id);
        DetachGuard { store: self, id, handler }
    }

    pub(crate) fn reattach(&mut self, id: SubscriptionId, handler: OperationHandler) {
        self.subscribers.insert(id, handler);
    }

    // ---- C2 direct node access ----------------------------------------------

    pub fn get_node(&mut self, id: &NodeId) -> Option<INode> {
        self.read(|s| s.get(id))
    }

    pub fn get_root_node(&mut self) -> Option<INode> {
        self.read(|s| s.root_id().and_then(|id| s.get(&id)))
    }

    pub fn get_all_nodes(&mut self) -> Vec<INode> {
        self.read(|s| s.all_nodes())
    }

    pub fn find_nodes_by_type(&mut self, stype: &str) -> Vec<INode> {
        self.read(|s| s.find_by_type(stype))
    }

    /// Insert `node` directly. Outside a transaction, `emit = false` bulk-seeds
    /// (matching [`NodeStore::set_node`]'s intended use for loading an
    /// existing document before any edits happen). Inside a transaction the
    /// overlay has no non-emitting write path, so `emit` is ignored and the
    /// create is always recorded as an op — there's no legitimate use for a
    /// silent bulk seed mid-transaction.
    pub fn set_node(&mut self, node: INode, emit: bool) -> Result<(), DataStoreError> {
        if self.overlay.is_some() {
            self.mutate(|s| s.create(node))?;
        } else {
            self.store.set_node(node, emit)?;
        }
        Ok(())
    }

    pub fn update_node(&mut self, id: &NodeId, patch: NodePatch) {
        self.mutate(|s| s.update(id, patch));
    }

    /// Destroy `id`, removing it from its parent's `content` too (§4.2 Lifecycle).
    pub fn delete_node(&mut self, id: &NodeId) -> Result<(), DataStoreError> {
        let schema = self.require_schema()?;
        self.mutate(|s| ContentOps::new(s, &schema).delete_node(id))?;
        Ok(())
    }

    // ---- C5 ContentOps -------------------------------------------------------

    pub fn add_child(&mut self, parent_id: &NodeId, template: &NodeTemplate) -> Result<NodeId, DataStoreError> {
        let schema = self.require_schema()?;
        Ok(self.mutate(|s| ContentOps::new(s, &schema).add_child(parent_id, template))?)
    }

    pub fn remove_child(&mut self, parent_id: &NodeId, child_id: &NodeId) -> Result<(), DataStoreError> {
        let schema = self.require_schema()?;
        Ok(self.mutate(|s| ContentOps::new(s, &schema).remove_child(parent_id, child_id))?)
    }

    pub fn move_node(&mut self, id: &NodeId, new_parent_id: &NodeId, position: Option<usize>) -> Result<(), DataStoreError> {
        let schema = self.require_schema()?;
        Ok(self.mutate(|s| ContentOps::new(s, &schema).move_node(id, new_parent_id, position))?)
    }

    pub fn move_children(&mut self, from_parent: &NodeId, to_parent: &NodeId, ids: &[NodeId]) -> Result<(), DataStoreError> {
        let schema = self.require_schema()?;
        Ok(self.mutate(|s| ContentOps::new(s, &schema).move_children(from_parent, to_parent, ids))?)
    }

    pub fn reorder_children(&mut self, parent_id: &NodeId, ordered_ids: Vec<NodeId>) -> Result<(), DataStoreError> {
        let schema = self.require_schema()?;
        Ok(self.mutate(|s| ContentOps::new(s, &schema).reorder_children(parent_id, ordered_ids))?)
    }

    pub fn copy_node(&mut self, src_id: &NodeId, new_parent_id: &NodeId) -> Result<NodeId, DataStoreError> {
        let schema = self.require_schema()?;
        Ok(self.mutate(|s| ContentOps::new(s, &schema).copy_node(src_id, new_parent_id))?)
    }

    pub fn clone_node_with_children(&mut self, src_id: &NodeId, new_parent_id: &NodeId) -> Result<NodeId, DataStoreError> {
        let schema = self.require_schema()?;
        Ok(self.mutate(|s| ContentOps::new(s, &schema).clone_node_with_children(src_id, new_parent_id))?)
    }

    // ---- C6 MarkOps ------------------------------------------------------------

    pub fn set_marks(&mut self, node_id: &NodeId, marks: Vec<Mark>, should_normalize: bool) {
        self.mutate(|s| MarkOps::new(s).set_marks(node_id, marks, should_normalize));
    }

    pub fn remove_empty_marks(&mut self, node_id: &NodeId) -> usize {
        self.mutate(|s| MarkOps::new(s).remove_empty_marks(node_id))
    }

    pub fn get_mark_statistics(&mut self, node_id: &NodeId) -> docstore_ops::MarkStatistics {
        self.read(|s| {
            s.get(node_id)
                .map(|n| docstore_ops::mark_statistics(&n.marks))
                .unwrap_or_default()
        })
    }

    pub fn toggle_mark(&mut self, node_id: &NodeId, mark: Mark) {
        self.mutate(|s| MarkOps::new(s).toggle_mark(node_id, mark));
    }

    // ---- C7 RangeOps & SplitMerge ------------------------------------------------

    pub fn delete_text(&mut self, sel: &ModelSelection) -> String {
        self.mutate(|s| docstore_ops::delete_text(s, sel))
    }

    pub fn insert_text(&mut self, node_id: &NodeId, offset: usize, text: &str) {
        self.mutate(|s| docstore_ops::insert_text(s, node_id, offset, text));
    }

    pub fn replace_text(&mut self, sel: &ModelSelection, text: &str) -> String {
        self.mutate(|s| docstore_ops::replace_text(s, sel, text))
    }

    pub fn extract_text(&mut self, sel: &ModelSelection) -> String {
        self.read(|s| docstore_ops::extract_text(s, sel))
    }

    pub fn copy_text(&mut self, sel: &ModelSelection) -> String {
        self.read(|s| docstore_ops::copy_text(s, sel))
    }

    pub fn get_text_length(&mut self, sel: &ModelSelection) -> usize {
        self.read(|s| docstore_ops::get_text_length(s, sel))
    }

    pub fn move_text(&mut self, from: &ModelSelection, to_node: &NodeId, to_offset: usize) -> String {
        self.mutate(|s| docstore_ops::move_text(s, from, to_node, to_offset))
    }

    pub fn duplicate_text(&mut self, sel: &ModelSelection) -> String {
        self.mutate(|s| docstore_ops::duplicate_text(s, sel))
    }

    pub fn wrap(&mut self, node_id: &NodeId, left: &str, right: &str) {
        self.mutate(|s| docstore_ops::wrap(s, node_id, left, right));
    }

    pub fn unwrap(&mut self, node_id: &NodeId, left: &str, right: &str) {
        self.mutate(|s| docstore_ops::unwrap(s, node_id, left, right));
    }

    pub fn indent(&mut self, node_id: &NodeId, prefix: &str) {
        self.mutate(|s| docstore_ops::indent(s, node_id, prefix));
    }

    pub fn outdent(&mut self, node_id: &NodeId, prefix: &str) {
        self.mutate(|s| docstore_ops::outdent(s, node_id, prefix));
    }

    pub fn find_text(&mut self, node_id: &NodeId, needle: &str) -> Vec<usize> {
        self.read(|s| docstore_ops::find_text(s, node_id, needle))
    }

    pub fn find_all(&mut self, node_id: &NodeId, pattern: &regex::Regex) -> Vec<Range> {
        self.read(|s| docstore_ops::find_all(s, node_id, pattern))
    }

    pub fn replace(&mut self, node_id: &NodeId, pattern: &regex::Regex, replacement: &str) {
        self.mutate(|s| docstore_ops::replace(s, node_id, pattern, replacement));
    }

    pub fn trim_text(&mut self, node_id: &NodeId) {
        self.mutate(|s| docstore_ops::trim_text(s, node_id));
    }

    pub fn normalize_whitespace(&mut self, node_id: &NodeId) {
        self.mutate(|s| docstore_ops::normalize_whitespace(s, node_id));
    }

    pub fn apply_mark(&mut self, node_id: &NodeId, mark: Mark) {
        self.mutate(|s| docstore_ops::apply_mark(s, node_id, mark));
    }

    pub fn remove_mark(&mut self, node_id: &NodeId, stype: &str) {
        self.mutate(|s| docstore_ops::remove_mark(s, node_id, stype));
    }

    pub fn constrain_marks_to_range(&mut self, node_id: &NodeId, range: Range) {
        self.mutate(|s| docstore_ops::constrain_marks_to_range(s, node_id, range));
    }

    pub fn expand_to_word(&mut self, node_id: &NodeId, range: Range) -> Range {
        self.read(|s| docstore_ops::expand_to_word(s, node_id, range))
    }

    pub fn normalize_range(&self, range: Range) -> Range {
        docstore_ops::normalize_range(range)
    }

    pub fn split_block_node(&mut self, block_id: &NodeId, pos: usize) -> Result<NodeId, DataStoreError> {
        Ok(self.mutate(|s| docstore_ops::split_block_node(s, block_id, pos))?)
    }

    pub fn merge_block_nodes(&mut self, left_id: &NodeId, right_id: &NodeId) -> Result<(), DataStoreError> {
        Ok(self.mutate(|s| docstore_ops::merge_block_nodes(s, left_id, right_id))?)
    }

    // ---- C8 Traversal --------------------------------------------------------

    fn traverse<R>(&mut self, f: impl for<'a> FnOnce(&'a Traversal<'a, dyn MutableStore>) -> R) -> Result<R, DataStoreError> {
        let schema = self.require_schema()?;
        Ok(self.read(|s| f(&Traversal::new(s, &schema))))
    }

    pub fn get_next_node(&mut self, id: &NodeId) -> Result<Option<NodeId>, DataStoreError> {
        self.traverse(|t| t.get_next_node(id))?.map_err(Into::into)
    }

    pub fn get_previous_node(&mut self, id: &NodeId) -> Result<Option<NodeId>, DataStoreError> {
        self.traverse(|t| t.get_previous_node(id))?.map_err(Into::into)
    }

    pub fn get_next_editable_node(&mut self, id: &NodeId) -> Result<Option<NodeId>, DataStoreError> {
        self.traverse(|t| t.get_next_editable_node(id))?.map_err(Into::into)
    }

    pub fn get_previous_editable_node(&mut self, id: &NodeId) -> Result<Option<NodeId>, DataStoreError> {
        self.traverse(|t| t.get_previous_editable_node(id))?.map_err(Into::into)
    }

    pub fn get_editable_nodes(&mut self, options: &TraversalOptions, filter: Option<&dyn Fn(&INode) -> bool>) -> Result<Vec<NodeId>, DataStoreError> {
        self.traverse(|t| t.get_editable_nodes(options, filter))
    }

    pub fn get_selectable_nodes(&mut self, options: &TraversalOptions, filter: Option<&dyn Fn(&INode) -> bool>) -> Result<Vec<NodeId>, DataStoreError> {
        self.traverse(|t| t.get_selectable_nodes(options, filter))
    }

    pub fn get_draggable_nodes(&mut self, options: &TraversalOptions, filter: Option<&dyn Fn(&INode) -> bool>) -> Result<Vec<NodeId>, DataStoreError> {
        self.traverse(|t| t.get_draggable_nodes(options, filter))
    }

    pub fn get_droppable_nodes(&mut self, options: &TraversalOptions, filter: Option<&dyn Fn(&INode) -> bool>) -> Result<Vec<NodeId>, DataStoreError> {
        self.traverse(|t| t.get_droppable_nodes(options, filter))
    }

    pub fn can_drop_node(&mut self, target_id: &NodeId, node_id: &NodeId) -> Result<bool, DataStoreError> {
        self.traverse(|t| t.can_drop_node(target_id, node_id))
    }

    pub fn compare_document_order(&mut self, a: &NodeId, b: &NodeId) -> Result<Option<std::cmp::Ordering>, DataStoreError> {
        self.traverse(|t| t.compare_document_order(a, b))
    }

    pub fn get_node_path(&mut self, id: &NodeId) -> Result<Vec<NodeId>, DataStoreError> {
        self.traverse(|t| t.get_node_path(id))?.map_err(Into::into)
    }

    // ---- C9 TemplateBuilder -------------------------------------------------

    pub fn create_node_with_children(&mut self, template: &NodeTemplate) -> Result<NodeId, DataStoreError> {
        let schema = self.require_schema()?;
        Ok(self.mutate(|s| template_builder::create_node_with_children(s, &schema, template))?)
    }
}
