//! Node templates: the not-yet-persisted shape used by schema validation and
//! [`create_node_with_children`](https://docs.rs/docstore-core) (C9).

use crate::ids::NodeId;
use crate::mark::{Attrs, Mark};
use serde::{Deserialize, Serialize};

/// A child slot in a [`NodeTemplate`]: either a nested template to create, or
/// a reference to an already-persisted node to attach as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateChild {
    Inline(Box<NodeTemplate>),
    Ref(NodeId),
}

/// A tree of not-yet-persisted nodes, as passed to `create_node_with_children`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<NodeId>,
    pub stype: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attributes: Attrs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<TemplateChild>,
}

impl NodeTemplate {
    pub fn new(stype: impl Into<String>) -> Self {
        Self {
            stype: stype.into(),
            ..Default::default()
        }
    }

    /// The `$alias` attribute, if one was set on this template node.
    pub fn alias(&self) -> Option<&str> {
        self.attributes
            .get(crate::node::ALIAS_ATTR)
            .and_then(|v| v.as_str())
    }
}
