//! C8: document-order traversal, editable-node navigation, path, and order comparison.

mod error;

pub use error::TraversalError;

use docstore_schema::Schema;
use docstore_store::MutableStore;
use docstore_types::{INode, NodeId};
use std::cmp::Ordering;

/// Which categories of node a whole-document scan should include.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraversalOptions {
    pub include_text: bool,
    pub include_inline: bool,
    pub include_editable_blocks: bool,
    pub include_blocks: bool,
    pub include_document: bool,
}

impl TraversalOptions {
    /// Every category included.
    pub fn all() -> Self {
        Self {
            include_text: true,
            include_inline: true,
            include_editable_blocks: true,
            include_blocks: true,
            include_document: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeCategory {
    Document,
    Text,
    Inline,
    EditableBlock,
    Block,
}

/// Read-only document-order navigation, bound to one store/schema pair.
pub struct Traversal<'s, S: MutableStore + ?Sized> {
    store: &'s S,
    schema: &'s Schema,
}

impl<'s, S: MutableStore + ?Sized> Traversal<'s, S> {
    pub fn new(store: &'s S, schema: &'s Schema) -> Self {
        Self { store, schema }
    }

    /// Full depth-first pre-order traversal starting at the root.
    fn document_order_ids(&self) -> Vec<NodeId> {
        let mut result = Vec::new();
        if let Some(root_id) = self.store.root_id() {
            self.walk(&root_id, &mut result);
        }
        result
    }

    fn walk(&self, id: &NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.store.get(id) else { return };
        out.push(id.clone());
        for child in node.children() {
            self.walk(child, out);
        }
    }

    fn categorize(&self, node: &INode) -> NodeCategory {
        if node.parent_id.is_none() {
            return NodeCategory::Document;
        }
        let group = self.schema.get_node_type(&node.stype).and_then(|d| d.group.as_deref());
        if group == Some("inline") {
            return NodeCategory::Inline;
        }
        let editable = self.schema.get_node_type(&node.stype).is_some_and(|d| d.editable);
        if node.text.is_some() {
            if editable {
                NodeCategory::EditableBlock
            } else {
                NodeCategory::Text
            }
        } else {
            NodeCategory::Block
        }
    }

    fn require(&self, id: &NodeId) -> Result<INode, TraversalError> {
        self.store.get(id).ok_or_else(|| TraversalError::NodeNotFound(id.clone()))
    }

    /// The node immediately following `id` in document order, if any.
    pub fn get_next_node(&self, id: &NodeId) -> Result<Option<NodeId>, TraversalError> {
        self.require(id)?;
        let order = self.document_order_ids();
        let Some(idx) = order.iter().position(|x| x == id) else {
            return Ok(None);
        };
        Ok(order.get(idx + 1).cloned())
    }

    /// The node immediately preceding `id` in document order, if any.
    pub fn get_previous_node(&self, id: &NodeId) -> Result<Option<NodeId>, TraversalError> {
        self.require(id)?;
        let order = self.document_order_ids();
        let Some(idx) = order.iter().position(|x| x == id) else {
            return Ok(None);
        };
        if idx == 0 {
            Ok(None)
        } else {
            Ok(order.get(idx - 1).cloned())
        }
    }

    /// The next node after `id`, in document order, that is editable (§4.1).
    pub fn get_next_editable_node(&self, id: &NodeId) -> Result<Option<NodeId>, TraversalError> {
        self.require(id)?;
        let order = self.document_order_ids();
        let Some(idx) = order.iter().position(|x| x == id) else {
            return Ok(None);
        };
        for candidate in &order[idx + 1..] {
            if let Some(node) = self.store.get(candidate) {
                if self.schema.is_editable(&node) {
                    return Ok(Some(candidate.clone()));
                }
            }
        }
        Ok(None)
    }

    /// The previous node before `id`, in document order, that is editable (§4.1).
    pub fn get_previous_editable_node(&self, id: &NodeId) -> Result<Option<NodeId>, TraversalError> {
        self.require(id)?;
        let order = self.document_order_ids();
        let Some(idx) = order.iter().position(|x| x == id) else {
            return Ok(None);
        };
        for candidate in order[..idx].iter().rev() {
            if let Some(node) = self.store.get(candidate) {
                if self.schema.is_editable(&node) {
                    return Ok(Some(candidate.clone()));
                }
            }
        }
        Ok(None)
    }

    fn scan(
        &self,
        options: &TraversalOptions,
        filter: Option<&dyn Fn(&INode) -> bool>,
        predicate: impl Fn(&Schema, &INode) -> bool,
    ) -> Vec<NodeId> {
        let mut result = Vec::new();
        for id in self.document_order_ids() {
            let Some(node) = self.store.get(&id) else { continue };
            if !predicate(self.schema, &node) {
                continue;
            }
            let included = match self.categorize(&node) {
                NodeCategory::Document => options.include_document,
                NodeCategory::Text => options.include_text,
                NodeCategory::Inline => options.include_inline,
                NodeCategory::EditableBlock => options.include_editable_blocks,
                NodeCategory::Block => options.include_blocks,
            };
            if !included {
                continue;
            }
            if let Some(f) = filter {
                if !f(&node) {
                    continue;
                }
            }
            result.push(id);
        }
        result
    }

    pub fn get_editable_nodes(&self, options: &TraversalOptions, filter: Option<&dyn Fn(&INode) -> bool>) -> Vec<NodeId> {
        self.scan(options, filter, Schema::is_editable)
    }

    pub fn get_selectable_nodes(&self, options: &TraversalOptions, filter: Option<&dyn Fn(&INode) -> bool>) -> Vec<NodeId> {
        self.scan(options, filter, Schema::is_selectable)
    }

    pub fn get_draggable_nodes(&self, options: &TraversalOptions, filter: Option<&dyn Fn(&INode) -> bool>) -> Vec<NodeId> {
        self.scan(options, filter, Schema::is_draggable)
    }

    pub fn get_droppable_nodes(&self, options: &TraversalOptions, filter: Option<&dyn Fn(&INode) -> bool>) -> Vec<NodeId> {
        self.scan(options, filter, Schema::is_droppable)
    }

    /// Whether `node_id` may be dropped onto `target_id`: the target must be
    /// droppable and `node_id`'s type admissible under the target's content expression.
    pub fn can_drop_node(&self, target_id: &NodeId, node_id: &NodeId) -> bool {
        let Some(target) = self.store.get(target_id) else { return false };
        let Some(node) = self.store.get(node_id) else { return false };
        self.schema.is_droppable(&target) && self.schema.admits_child(&target.stype, &node.stype)
    }

    /// `< 0`/`0`/`> 0` via document-order index comparison; `None` if either id is absent.
    pub fn compare_document_order(&self, a: &NodeId, b: &NodeId) -> Option<Ordering> {
        let order = self.document_order_ids();
        let ia = order.iter().position(|x| x == a)?;
        let ib = order.iter().position(|x| x == b)?;
        Some(ia.cmp(&ib))
    }

    /// The root-to-node chain of ids, root first.
    pub fn get_node_path(&self, id: &NodeId) -> Result<Vec<NodeId>, TraversalError> {
        let mut path = Vec::new();
        let mut current = self.require(id)?;
        path.push(current.sid.clone());
        while let Some(parent_id) = current.parent_id.clone() {
            let Some(parent) = self.store.get(&parent_id) else { break };
            path.push(parent.sid.clone());
            current = parent;
        }
        path.reverse();
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_schema::NodeTypeDef;
    use docstore_store::NodeStore;
    use docstore_types::INode;

    fn schema() -> Schema {
        Schema::builder("doc")
            .node_type("doc", NodeTypeDef::new().with_content("paragraph+"))
            .node_type(
                "paragraph",
                NodeTypeDef::new().with_group("block").with_content("inline-text+").selectable().draggable().droppable(),
            )
            .node_type("inline-text", NodeTypeDef::new().with_group("inline"))
            .build()
    }

    fn seeded_store() -> (NodeStore, NodeId, NodeId, NodeId, NodeId) {
        let mut store = NodeStore::new(1);
        let doc_id = NodeId::new("doc");
        let p1 = NodeId::new("p1");
        let p2 = NodeId::new("p2");
        let t1 = NodeId::new("t1");

        let mut doc = INode::new(doc_id.clone(), "doc");
        doc.content = Some(vec![p1.clone(), p2.clone()]);
        store.set_node(doc, false).unwrap();

        let mut para1 = INode::new(p1.clone(), "paragraph");
        para1.parent_id = Some(doc_id.clone());
        para1.content = Some(vec![t1.clone()]);
        store.set_node(para1, false).unwrap();

        let mut text = INode::new(t1.clone(), "inline-text");
        text.parent_id = Some(p1.clone());
        text.text = Some("hi".into());
        store.set_node(text, false).unwrap();

        let mut para2 = INode::new(p2.clone(), "paragraph");
        para2.parent_id = Some(doc_id.clone());
        store.set_node(para2, false).unwrap();

        (store, doc_id, p1, p2, t1)
    }

    #[test]
    fn next_and_previous_node_follow_pre_order() {
        let (store, doc_id, p1, p2, t1) = seeded_store();
        let schema = schema();
        let trav = Traversal::new(&store, &schema);
        assert_eq!(trav.get_next_node(&doc_id).unwrap(), Some(p1.clone()));
        assert_eq!(trav.get_next_node(&p1).unwrap(), Some(t1.clone()));
        assert_eq!(trav.get_next_node(&t1).unwrap(), Some(p2.clone()));
        assert_eq!(trav.get_next_node(&p2).unwrap(), None);
        assert_eq!(trav.get_previous_node(&p2).unwrap(), Some(t1));
    }

    #[test]
    fn unknown_id_is_an_error() {
        let (store, ..) = seeded_store();
        let schema = schema();
        let trav = Traversal::new(&store, &schema);
        assert!(trav.get_next_node(&NodeId::new("missing")).is_err());
    }

    #[test]
    fn next_editable_node_skips_non_editable_blocks() {
        let (store, doc_id, _p1, _p2, t1) = seeded_store();
        let schema = schema();
        let trav = Traversal::new(&store, &schema);
        assert_eq!(trav.get_next_editable_node(&doc_id).unwrap(), Some(t1));
    }

    #[test]
    fn get_node_path_runs_root_to_node() {
        let (store, doc_id, p1, _p2, t1) = seeded_store();
        let schema = schema();
        let trav = Traversal::new(&store, &schema);
        assert_eq!(trav.get_node_path(&t1).unwrap(), vec![doc_id, p1, t1]);
    }

    #[test]
    fn compare_document_order_respects_traversal_order() {
        let (store, _doc_id, p1, p2, _t1) = seeded_store();
        let schema = schema();
        let trav = Traversal::new(&store, &schema);
        assert_eq!(trav.compare_document_order(&p1, &p2), Some(Ordering::Less));
        assert_eq!(trav.compare_document_order(&p2, &p1), Some(Ordering::Greater));
    }

    #[test]
    fn can_drop_node_checks_droppable_and_admissibility() {
        let (store, _doc_id, p1, p2, t1) = seeded_store();
        let schema = schema();
        let trav = Traversal::new(&store, &schema);
        assert!(trav.can_drop_node(&p2, &t1));
        assert!(!trav.can_drop_node(&p1, &p2), "paragraph does not admit another paragraph as a child");
    }

    #[test]
    fn get_selectable_nodes_returns_only_selectable_blocks() {
        let (store, _doc_id, p1, p2, _t1) = seeded_store();
        let schema = schema();
        let trav = Traversal::new(&store, &schema);
        let nodes = trav.get_selectable_nodes(&TraversalOptions::all(), None);
        assert_eq!(nodes, vec![p1, p2]);
    }
}
