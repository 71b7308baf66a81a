//! C5: parent/child mutations with invariant maintenance.

use crate::error::OpsError;
use docstore_schema::Schema;
use docstore_store::{MutableStore, StoreError};
use docstore_types::{NodeId, NodePatch, NodeTemplate, TemplateChild, ALIAS_ATTR};
use std::collections::HashSet;

/// Recursively materialize `template` into `store`, validating against
/// `schema` and enforcing alias uniqueness across the whole subtree. Returns
/// the id of the newly created root of the materialized subtree. Does not
/// attach the result to any existing parent's `content` — callers that
/// attach under an existing node do that themselves.
pub fn materialize_template<S: MutableStore + ?Sized>(
    store: &mut S,
    schema: &Schema,
    template: &NodeTemplate,
    parent_type: Option<&str>,
) -> Result<NodeId, OpsError> {
    schema.validate(template, parent_type)?;
    let mut seen_aliases = HashSet::new();
    check_alias_uniqueness(template, &mut seen_aliases)?;
    materialize(store, template, None)
}

fn check_alias_uniqueness(template: &NodeTemplate, seen: &mut HashSet<String>) -> Result<(), OpsError> {
    if let Some(alias) = template.alias() {
        if !seen.insert(alias.to_string()) {
            return Err(OpsError::DuplicateAlias(alias.to_string()));
        }
    }
    for child in &template.content {
        if let TemplateChild::Inline(child_template) = child {
            check_alias_uniqueness(child_template, seen)?;
        }
    }
    Ok(())
}

fn materialize<S: MutableStore + ?Sized>(
    store: &mut S,
    template: &NodeTemplate,
    parent_id: Option<NodeId>,
) -> Result<NodeId, OpsError> {
    let sid = template.sid.clone().unwrap_or_else(|| store.next_id());

    let mut children = Vec::with_capacity(template.content.len());
    for child in &template.content {
        match child {
            TemplateChild::Ref(id) => children.push(id.clone()),
            TemplateChild::Inline(child_template) => {
                children.push(materialize(store, child_template, Some(sid.clone()))?);
            }
        }
    }

    let mut attributes = template.attributes.clone();
    let alias = attributes.remove(ALIAS_ATTR).and_then(|v| v.as_str().map(str::to_string));

    let node = docstore_types::INode {
        sid: sid.clone(),
        stype: template.stype.clone(),
        attributes,
        text: template.text.clone(),
        content: if template.content.is_empty() { None } else { Some(children) },
        parent_id,
        marks: template.marks.clone(),
    };
    store.create(node)?;
    if let Some(alias) = alias {
        store.set_alias(alias, sid.clone());
    }
    Ok(sid)
}

/// Parent/child mutation operations over a [`MutableStore`].
pub struct ContentOps<'s, S: MutableStore + ?Sized> {
    store: &'s mut S,
    schema: &'s Schema,
}

impl<'s, S: MutableStore + ?Sized> ContentOps<'s, S> {
    pub fn new(store: &'s mut S, schema: &'s Schema) -> Self {
        Self { store, schema }
    }

    /// Validate `template` against `parent_id`'s content expression, allocate
    /// ids, write the node(s), append to the parent's `content`. Emits
    /// `create` (per materialized node) plus one parent `update`.
    pub fn add_child(&mut self, parent_id: &NodeId, template: &NodeTemplate) -> Result<NodeId, OpsError> {
        let parent = self.require(parent_id)?;
        let new_id = materialize_template(self.store, self.schema, template, Some(&parent.stype))?;
        let mut content = parent.children().to_vec();
        content.push(new_id.clone());
        self.store.update(parent_id, NodePatch::with_content(content));
        Ok(new_id)
    }

    /// Detach `child_id` from `parent_id`'s content and clear its `parent_id`.
    /// The node itself is not deleted.
    pub fn remove_child(&mut self, parent_id: &NodeId, child_id: &NodeId) -> Result<(), OpsError> {
        let parent = self.require(parent_id)?;
        let mut content = parent.children().to_vec();
        content.retain(|c| c != child_id);
        self.store.update(parent_id, NodePatch::with_content(content));
        self.store.update(child_id, NodePatch::with_parent(None));
        Ok(())
    }

    /// Remove `id` from its parent's content and tombstone it. Emits only `delete`.
    pub fn delete_node(&mut self, id: &NodeId) -> Result<(), OpsError> {
        let node = self.require(id)?;
        if let Some(parent_id) = &node.parent_id {
            if let Some(parent) = self.store.get(parent_id) {
                let mut content = parent.children().to_vec();
                content.retain(|c| c != id);
                self.store.apply_patch_silently(parent_id, NodePatch::with_content(content));
            }
        }
        self.store.delete(id);
        Ok(())
    }

    /// Move `id` to `new_parent_id` at `position` (default: append). A move
    /// to the same parent at the same resulting index is a no-op (no op
    /// emitted). Emits exactly one `move` otherwise.
    pub fn move_node(
        &mut self,
        id: &NodeId,
        new_parent_id: &NodeId,
        position: Option<usize>,
    ) -> Result<(), OpsError> {
        let node = self.require(id)?;
        let new_parent = self.require(new_parent_id)?;
        let same_parent = node.parent_id.as_ref() == Some(new_parent_id);

        if same_parent {
            let mut content = new_parent.children().to_vec();
            let current_index = content.iter().position(|c| c == id).unwrap_or(content.len());
            content.remove(current_index);
            let target_index = position.unwrap_or(content.len()).min(content.len());
            if target_index == current_index {
                return Ok(());
            }
            content.insert(target_index, id.clone());
            self.store.apply_patch_silently(new_parent_id, NodePatch::with_content(content));
            self.store.emit_move(id.clone(), new_parent_id.clone(), target_index);
            return Ok(());
        }

        if let Some(old_parent_id) = &node.parent_id {
            if let Some(old_parent) = self.store.get(old_parent_id) {
                let mut old_content = old_parent.children().to_vec();
                old_content.retain(|c| c != id);
                self.store.apply_patch_silently(old_parent_id, NodePatch::with_content(old_content));
            }
        }
        let mut new_content = new_parent.children().to_vec();
        let target_index = position.unwrap_or(new_content.len()).min(new_content.len());
        new_content.insert(target_index, id.clone());
        self.store.apply_patch_silently(new_parent_id, NodePatch::with_content(new_content));
        self.store.apply_patch_silently(id, NodePatch::with_parent(Some(new_parent_id.clone())));
        self.store.emit_move(id.clone(), new_parent_id.clone(), target_index);
        Ok(())
    }

    /// Move every id in `ids`, in order, from `from_parent` to the end of `to_parent`.
    pub fn move_children(
        &mut self,
        from_parent: &NodeId,
        to_parent: &NodeId,
        ids: &[NodeId],
    ) -> Result<(), OpsError> {
        let _ = from_parent;
        for id in ids {
            self.move_node(id, to_parent, None)?;
        }
        Ok(())
    }

    /// Reorder `parent_id`'s children to `ordered_ids`, emitting one `move` per
    /// id whose index actually changed.
    pub fn reorder_children(&mut self, parent_id: &NodeId, ordered_ids: Vec<NodeId>) -> Result<(), OpsError> {
        let parent = self.require(parent_id)?;
        let old_content = parent.children().to_vec();
        self.store.apply_patch_silently(parent_id, NodePatch::with_content(ordered_ids.clone()));
        for (new_index, id) in ordered_ids.iter().enumerate() {
            let old_index = old_content.iter().position(|c| c == id);
            if old_index != Some(new_index) {
                self.store.emit_move(id.clone(), parent_id.clone(), new_index);
            }
        }
        Ok(())
    }

    /// Deep-copy the subtree rooted at `src_id` with fresh ids and attach it
    /// under `new_parent_id`. Emits `create` per copied node plus one parent
    /// `update` — never a `move`.
    pub fn copy_node(&mut self, src_id: &NodeId, new_parent_id: &NodeId) -> Result<NodeId, OpsError> {
        self.deep_copy_and_attach(src_id, new_parent_id)
    }

    /// Deep-copy the subtree rooted at `src_id`, preserving attributes
    /// (`$alias` stripped, as for every committed node) and attach it under
    /// `new_parent_id`. Emits `create` per cloned node plus one parent `update`.
    pub fn clone_node_with_children(&mut self, src_id: &NodeId, new_parent_id: &NodeId) -> Result<NodeId, OpsError> {
        self.deep_copy_and_attach(src_id, new_parent_id)
    }

    fn deep_copy_and_attach(&mut self, src_id: &NodeId, new_parent_id: &NodeId) -> Result<NodeId, OpsError> {
        let new_parent = self.require(new_parent_id)?;
        let new_root_id = self.deep_copy(src_id, Some(new_parent_id.clone()))?;
        let mut content = new_parent.children().to_vec();
        content.push(new_root_id.clone());
        self.store.update(new_parent_id, NodePatch::with_content(content));
        Ok(new_root_id)
    }

    fn deep_copy(&mut self, src_id: &NodeId, parent_id: Option<NodeId>) -> Result<NodeId, OpsError> {
        let src = self.require(src_id)?;
        let new_id = self.store.next_id();

        let mut children = Vec::with_capacity(src.children().len());
        for child_id in src.children() {
            children.push(self.deep_copy(&child_id.clone(), Some(new_id.clone()))?);
        }

        let mut attributes = src.attributes.clone();
        attributes.remove(ALIAS_ATTR);

        let node = docstore_types::INode {
            sid: new_id.clone(),
            stype: src.stype.clone(),
            attributes,
            text: src.text.clone(),
            content: src.content.as_ref().map(|_| children),
            parent_id,
            marks: src.marks.clone(),
        };
        self.store.create(node)?;
        Ok(new_id)
    }

    fn require(&self, id: &NodeId) -> Result<docstore_types::INode, OpsError> {
        self.store.get(id).ok_or_else(|| OpsError::Store(StoreError::NodeNotFound(id.clone())))
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
                NodeTypeDef::new().with_group("block").with_content("inline-text+"),
            )
            .node_type("inline-text", NodeTypeDef::new().with_group("inline"))
            .build()
    }

    fn seeded_store() -> (NodeStore, NodeId, NodeId) {
        let mut store = NodeStore::new(1);
        let doc_id = NodeId::new("seed-doc");
        let mut doc = INode::new(doc_id.clone(), "doc");
        let para_id = NodeId::new("seed-p1");
        doc.content = Some(vec![para_id.clone()]);
        store.set_node(doc, false).unwrap();
        let mut para = INode::new(para_id.clone(), "paragraph");
        para.parent_id = Some(doc_id.clone());
        store.set_node(para, false).unwrap();
        (store, doc_id, para_id)
    }

    #[test]
    fn add_child_validates_and_appends() {
        let (mut store, _doc, para_id) = seeded_store();
        let schema = schema();
        let mut ops = ContentOps::new(&mut store, &schema);
        let template = NodeTemplate {
            stype: "inline-text".into(),
            text: Some("hi".into()),
            ..Default::default()
        };
        let child_id = ops.add_child(&para_id, &template).unwrap();
        assert_eq!(store.get_node(&para_id).unwrap().children(), &[child_id]);
    }

    #[test]
    fn move_to_same_spot_is_a_no_op() {
        let (mut store, doc_id, para_id) = seeded_store();
        let schema = schema();
        let mut ops = ContentOps::new(&mut store, &schema);
        ops.move_node(&para_id, &doc_id, Some(0)).unwrap();
        assert!(store.take_pending_ops().is_empty());
    }

    #[test]
    fn delete_node_emits_only_delete() {
        let (mut store, _doc, para_id) = seeded_store();
        let schema = schema();
        store.take_pending_ops();
        {
            let mut ops = ContentOps::new(&mut store, &schema);
            ops.delete_node(&para_id).unwrap();
        }
        let ops_emitted = store.take_pending_ops();
        assert_eq!(ops_emitted.len(), 1);
        assert!(matches!(ops_emitted[0], docstore_types::Operation::Delete { .. }));
    }

    #[test]
    fn copy_node_creates_a_fresh_id_and_appends_to_the_new_parent() {
        let (mut store, doc_id, para_id) = seeded_store();
        let schema = schema();
        let mut ops = ContentOps::new(&mut store, &schema);
        let copy_id = ops.copy_node(&para_id, &doc_id).unwrap();
        assert_ne!(copy_id, para_id);
        assert_eq!(store.get_node(&doc_id).unwrap().children(), &[para_id, copy_id]);
    }

    #[test]
    fn reorder_children_emits_a_move_per_changed_index() {
        let mut store = NodeStore::new(1);
        let doc_id = NodeId::new("seed-doc");
        let mut doc = INode::new(doc_id.clone(), "doc");
        let a = NodeId::new("seed-a");
        let b = NodeId::new("seed-b");
        doc.content = Some(vec![a.clone(), b.clone()]);
        store.set_node(doc, false).unwrap();
        let schema = schema();
        let mut ops = ContentOps::new(&mut store, &schema);
        ops.reorder_children(&doc_id, vec![b.clone(), a.clone()]).unwrap();
        let emitted = store.take_pending_ops();
        assert_eq!(emitted.len(), 2, "both entries changed index");
    }
}
