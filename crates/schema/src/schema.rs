//! The declarative node/mark type registry.

use crate::content_expr::ContentExpr;
use crate::error::SchemaError;
use docstore_types::{INode, NodeTemplate, TemplateChild};
use std::collections::HashMap;

/// Required attribute names on a node type, and whether each is required.
pub type AttrSpec = HashMap<String, bool>;

/// Declarative definition of one node type.
#[derive(Debug, Clone)]
pub struct NodeTypeDef {
    pub group: Option<String>,
    pub content: Option<ContentExpr>,
    pub attrs: AttrSpec,
    pub atom: bool,
    pub editable: bool,
    pub selectable: bool,
    pub draggable: bool,
    pub droppable: bool,
    pub indentable: bool,
    pub indent_group: Option<String>,
    pub indent_parent_types: Vec<String>,
    pub max_indent_level: Option<u32>,
}

impl Default for NodeTypeDef {
    fn default() -> Self {
        Self {
            group: None,
            content: None,
            attrs: AttrSpec::new(),
            atom: false,
            editable: false,
            selectable: false,
            draggable: false,
            droppable: false,
            indentable: false,
            indent_group: None,
            indent_parent_types: Vec::new(),
            max_indent_level: None,
        }
    }
}

impl NodeTypeDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_content(mut self, expr: &str) -> Self {
        self.content = Some(ContentExpr::parse(expr).expect("valid content expression"));
        self
    }

    pub fn require_attr(mut self, name: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), true);
        self
    }

    pub fn optional_attr(mut self, name: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), false);
        self
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn selectable(mut self) -> Self {
        self.selectable = true;
        self
    }

    pub fn draggable(mut self) -> Self {
        self.draggable = true;
        self
    }

    pub fn droppable(mut self) -> Self {
        self.droppable = true;
        self
    }

    pub fn indentable(mut self) -> Self {
        self.indentable = true;
        self
    }
}

/// Declarative definition of one mark type.
#[derive(Debug, Clone, Default)]
pub struct MarkTypeDef {
    pub group: Option<String>,
    pub attrs: AttrSpec,
}

impl MarkTypeDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Immutable bundle of node/mark type definitions and the document's root type.
#[derive(Debug, Clone)]
pub struct Schema {
    node_types: HashMap<String, NodeTypeDef>,
    mark_types: HashMap<String, MarkTypeDef>,
    top_node: String,
}

impl Schema {
    pub fn builder(top_node: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            node_types: HashMap::new(),
            mark_types: HashMap::new(),
            top_node: top_node.into(),
        }
    }

    pub fn top_node(&self) -> &str {
        &self.top_node
    }

    pub fn get_node_type(&self, name: &str) -> Option<&NodeTypeDef> {
        self.node_types.get(name)
    }

    pub fn get_mark_type(&self, name: &str) -> Option<&MarkTypeDef> {
        self.mark_types.get(name)
    }

    pub fn node_types(&self) -> impl Iterator<Item = (&String, &NodeTypeDef)> {
        self.node_types.iter()
    }

    // -- metadata predicates consumed by traversal (C8) --

    /// A node is editable if it's in the `inline` group, or it carries a
    /// `text` field at all — a literal text-bearing instance is editable on
    /// its own, with no schema flag required. `editable: true` on the type
    /// is subsumed by the text check; it exists in the schema only to let a
    /// type declare intent even for instances that happen to have no text.
    pub fn is_editable(&self, node: &INode) -> bool {
        match self.get_node_type(&node.stype) {
            Some(def) => def.group.as_deref() == Some("inline") || node.text.is_some(),
            None => false,
        }
    }

    pub fn is_selectable(&self, node: &INode) -> bool {
        self.get_node_type(&node.stype).is_some_and(|d| d.selectable)
    }

    pub fn is_draggable(&self, node: &INode) -> bool {
        self.get_node_type(&node.stype).is_some_and(|d| d.draggable)
    }

    pub fn is_droppable(&self, node: &INode) -> bool {
        self.get_node_type(&node.stype).is_some_and(|d| d.droppable)
    }

    pub fn is_indentable(&self, node: &INode) -> bool {
        self.get_node_type(&node.stype).is_some_and(|d| d.indentable)
    }

    /// Whether `child_type` may be inserted anywhere under a node of type `parent_type`,
    /// ignoring overall cardinality (used by incremental content ops, per spec §4.5).
    pub fn admits_child(&self, parent_type: &str, child_type: &str) -> bool {
        let Some(parent_def) = self.get_node_type(parent_type) else {
            return false;
        };
        let Some(expr) = &parent_def.content else {
            return false;
        };
        let child_group = self.get_node_type(child_type).and_then(|d| d.group.as_deref());
        expr.admits(child_type, child_group)
    }

    /// Recursively validate a template, checking: known types, required attrs,
    /// content-expression admissibility for every child, and mark-type existence.
    pub fn validate(&self, template: &NodeTemplate, parent_type: Option<&str>) -> Result<(), SchemaError> {
        let mut errors = Vec::new();
        self.validate_into(template, parent_type, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Invalid(errors))
        }
    }

    fn validate_into(&self, template: &NodeTemplate, parent_type: Option<&str>, errors: &mut Vec<String>) {
        let Some(def) = self.get_node_type(&template.stype) else {
            errors.push(format!("unknown node type {:?}", template.stype));
            return;
        };

        if let Some(parent_type) = parent_type {
            if !self.admits_child(parent_type, &template.stype) {
                errors.push(format!(
                    "node type {:?} is not admissible as a child of {:?}",
                    template.stype, parent_type
                ));
            }
        }

        for (attr, required) in &def.attrs {
            if *required && !template.attributes.contains_key(attr) {
                errors.push(format!(
                    "node type {:?} is missing required attribute {:?}",
                    template.stype, attr
                ));
            }
        }

        for mark in &template.marks {
            if self.get_mark_type(&mark.stype).is_none() {
                errors.push(format!("unknown mark type {:?}", mark.stype));
            }
        }

        if let Some(expr) = &def.content {
            let types: Vec<String> = template
                .content
                .iter()
                .map(|c| match c {
                    TemplateChild::Inline(t) => t.stype.clone(),
                    TemplateChild::Ref(_) => String::new(),
                })
                .collect();
            let refs_present = template
                .content
                .iter()
                .any(|c| matches!(c, TemplateChild::Ref(_)));
            if !refs_present {
                let pairs: Vec<(&str, Option<&str>)> = types
                    .iter()
                    .map(|t| (t.as_str(), self.get_node_type(t).and_then(|d| d.group.as_deref())))
                    .collect();
                if !expr.matches_sequence(pairs.into_iter()) {
                    errors.push(format!(
                        "content of node type {:?} does not satisfy {}",
                        template.stype, expr
                    ));
                }
            }
        } else if !template.content.is_empty() {
            errors.push(format!(
                "node type {:?} does not accept content",
                template.stype
            ));
        }

        for child in &template.content {
            if let TemplateChild::Inline(child_template) = child {
                self.validate_into(child_template, Some(&template.stype), errors);
            }
        }
    }
}

/// Builder for an immutable [`Schema`].
pub struct SchemaBuilder {
    node_types: HashMap<String, NodeTypeDef>,
    mark_types: HashMap<String, MarkTypeDef>,
    top_node: String,
}

impl SchemaBuilder {
    pub fn node_type(mut self, name: impl Into<String>, def: NodeTypeDef) -> Self {
        self.node_types.insert(name.into(), def);
        self
    }

    pub fn mark_type(mut self, name: impl Into<String>, def: MarkTypeDef) -> Self {
        self.mark_types.insert(name.into(), def);
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            node_types: self.node_types,
            mark_types: self.mark_types,
            top_node: self.top_node,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_types::NodeId;

    fn test_schema() -> Schema {
        Schema::builder("doc")
            .node_type(
                "doc",
                NodeTypeDef::new().with_content("paragraph+"),
            )
            .node_type(
                "paragraph",
                NodeTypeDef::new().with_group("block").with_content("inline-text+"),
            )
            .node_type(
                "inline-text",
                NodeTypeDef::new().with_group("inline"),
            )
            .mark_type("bold", MarkTypeDef::new())
            .build()
    }

    #[test]
    fn validates_well_formed_template() {
        let schema = test_schema();
        let template = NodeTemplate {
            stype: "paragraph".into(),
            content: vec![TemplateChild::Inline(Box::new(NodeTemplate {
                stype: "inline-text".into(),
                text: Some("hi".into()),
                ..Default::default()
            }))],
            ..Default::default()
        };
        assert!(schema.validate(&template, Some("doc")).is_ok());
    }

    #[test]
    fn rejects_unknown_type() {
        let schema = test_schema();
        let template = NodeTemplate::new("bogus");
        let err = schema.validate(&template, None).unwrap_err();
        assert!(matches!(err, SchemaError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_one_or_more_content() {
        let schema = test_schema();
        let template = NodeTemplate::new("paragraph");
        assert!(schema.validate(&template, Some("doc")).is_err());
    }

    #[test]
    fn ref_children_skip_cardinality_check() {
        let schema = test_schema();
        let template = NodeTemplate {
            stype: "paragraph".into(),
            content: vec![TemplateChild::Ref(NodeId::new("0:0"))],
            ..Default::default()
        };
        assert!(schema.validate(&template, Some("doc")).is_ok());
    }

    #[test]
    fn editable_block_requires_text_field() {
        let schema = Schema::builder("doc")
            .node_type("editable-block", NodeTypeDef::new().editable())
            .build();
        let mut node = INode::new(NodeId::new("0:0"), "editable-block");
        assert!(!schema.is_editable(&node));
        node.text = Some(String::new());
        assert!(schema.is_editable(&node));
    }

    #[test]
    fn plain_text_bearing_node_is_editable_without_the_editable_flag() {
        let schema = Schema::builder("doc")
            .node_type("caption", NodeTypeDef::new())
            .build();
        let mut node = INode::new(NodeId::new("0:0"), "caption");
        assert!(!schema.is_editable(&node), "no text yet");
        node.text = Some("a caption".into());
        assert!(schema.is_editable(&node), "a text-bearing instance is editable on its own, regardless of the editable flag");
    }
}
