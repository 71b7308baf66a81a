//! The node record: the sole structural entity in the document tree.

use crate::ids::NodeId;
use crate::mark::{Attrs, Mark};
use serde::{Deserialize, Serialize};

/// Transient attribute key carrying a template-local alias. Stripped before
/// a node is ever committed (invariant P5 / `INode::attributes` never keeps it).
pub const ALIAS_ATTR: &str = "$alias";

/// A structural node: the sole entity the store operates on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct INode {
    pub sid: NodeId,
    pub stype: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attributes: Attrs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<NodeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl INode {
    /// A bare node with no text, no content, no parent: callers fill in the rest.
    pub fn new(sid: NodeId, stype: impl Into<String>) -> Self {
        Self {
            sid,
            stype: stype.into(),
            attributes: Attrs::new(),
            text: None,
            content: None,
            parent_id: None,
            marks: Vec::new(),
        }
    }

    /// Children currently attached, or an empty slice for a contentless/text node.
    pub fn children(&self) -> &[NodeId] {
        self.content.as_deref().unwrap_or(&[])
    }

    /// `true` for nodes with no `parent_id` — a store must have exactly one (invariant P3).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Apply a patch in place, field-by-field (used by the overlay's merge-on-read).
    pub fn apply_patch(&mut self, patch: &NodePatch) {
        if let Some(stype) = &patch.stype {
            self.stype = stype.clone();
        }
        if let Some(attributes) = &patch.attributes {
            self.attributes = attributes.clone();
        }
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(parent_id) = &patch.parent_id {
            self.parent_id = parent_id.clone();
        }
        if let Some(marks) = &patch.marks {
            self.marks = marks.clone();
        }
    }
}

/// A partial update to an [`INode`]: every field is "set this" or "leave alone".
///
/// Used both as the overlay's shadow-write representation and as the payload
/// of an `Operation::Update` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attrs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Option<Vec<NodeId>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<NodeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<Mark>>,
}

impl NodePatch {
    pub fn is_empty(&self) -> bool {
        self == &NodePatch::default()
    }

    pub fn with_content(content: Vec<NodeId>) -> Self {
        Self {
            content: Some(Some(content)),
            ..Default::default()
        }
    }

    pub fn with_parent(parent_id: Option<NodeId>) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Default::default()
        }
    }

    pub fn with_marks(marks: Vec<Mark>) -> Self {
        Self {
            marks: Some(marks),
            ..Default::default()
        }
    }

    pub fn with_text(text: Option<String>) -> Self {
        Self {
            text: Some(text),
            ..Default::default()
        }
    }

    /// Fold a later patch onto this one: fields `newer` sets win, everything
    /// else keeps this patch's value. Used by the overlay to coalesce two
    /// updates to the same node within one transaction.
    pub fn merge(&mut self, newer: &NodePatch) {
        if newer.stype.is_some() {
            self.stype = newer.stype.clone();
        }
        if newer.attributes.is_some() {
            self.attributes = newer.attributes.clone();
        }
        if newer.text.is_some() {
            self.text = newer.text.clone();
        }
        if newer.content.is_some() {
            self.content = newer.content.clone();
        }
        if newer.parent_id.is_some() {
            self.parent_id = newer.parent_id.clone();
        }
        if newer.marks.is_some() {
            self.marks = newer.marks.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::Range;

    #[test]
    fn patch_only_touches_set_fields() {
        let mut node = INode::new(NodeId::new("0:0"), "paragraph");
        node.text = Some("hello".into());
        node.marks = vec![Mark::new("bold", Range::new(0, 2))];

        let patch = NodePatch::with_text(Some("hi".into()));
        node.apply_patch(&patch);

        assert_eq!(node.text.as_deref(), Some("hi"));
        assert_eq!(node.marks.len(), 1, "marks untouched by a text-only patch");
    }

    #[test]
    fn empty_patch_is_empty() {
        assert!(NodePatch::default().is_empty());
        assert!(!NodePatch::with_text(None).is_empty());
    }

    #[test]
    fn merge_keeps_untouched_fields_from_the_older_patch() {
        let mut patch = NodePatch::with_text(Some("a".into()));
        patch.marks = Some(vec![Mark::new("bold", Range::new(0, 1))]);
        patch.merge(&NodePatch::with_text(Some("b".into())));
        assert_eq!(patch.text, Some(Some("b".into())));
        assert_eq!(patch.marks.unwrap().len(), 1, "marks from the older patch survive");
    }
}
