//! Shared fixture schema and seed documents, reused across the workspace's
//! crate-level integration tests so every crate exercises the same document
//! shape instead of redefining its own ad hoc schema.

use docstore_schema::{MarkTypeDef, NodeTypeDef, Schema};
use docstore_store::NodeStore;
use docstore_types::{INode, NodeId};

pub const DOC: &str = "doc";
pub const HEADING: &str = "heading";
pub const PARAGRAPH: &str = "paragraph";
pub const IMAGE: &str = "image";
pub const INLINE_TEXT: &str = "inline-text";

pub const BOLD: &str = "bold";
pub const ITALIC: &str = "italic";
pub const LINK: &str = "link";

/// A small article-shaped schema: a document of headings, paragraphs, and a
/// block image atom, with inline text carrying bold/italic/link marks.
pub fn fixture_schema() -> Schema {
    Schema::builder(DOC)
        .node_type(DOC, NodeTypeDef::new().with_content("block+"))
        .node_type(
            HEADING,
            NodeTypeDef::new()
                .with_group("block")
                .with_content("inline-text+")
                .selectable()
                .draggable()
                .droppable(),
        )
        .node_type(
            PARAGRAPH,
            NodeTypeDef::new()
                .with_group("block")
                .with_content("inline-text+")
                .selectable()
                .draggable()
                .droppable()
                .indentable(),
        )
        .node_type(
            IMAGE,
            NodeTypeDef::new()
                .with_group("block")
                .atom()
                .require_attr("src")
                .selectable()
                .draggable(),
        )
        .node_type(INLINE_TEXT, NodeTypeDef::new().with_group("inline"))
        .mark_type(BOLD, MarkTypeDef::new())
        .mark_type(ITALIC, MarkTypeDef::new())
        .mark_type(LINK, MarkTypeDef::new())
        .build()
}

/// A two-paragraph document: `doc > [paragraph > inline-text("Hello "),
/// inline-text("world", bold) ; paragraph > inline-text("Second paragraph.")]`.
/// Seeded directly (no ops emitted), the ids are fixed so tests can reference
/// them by name.
pub fn seed_store() -> SeedDocument {
    let mut store = NodeStore::new(1);

    let doc_id = NodeId::new("fixture-doc");
    let p1_id = NodeId::new("fixture-p1");
    let p2_id = NodeId::new("fixture-p2");
    let t1_id = NodeId::new("fixture-t1");
    let t2_id = NodeId::new("fixture-t2");
    let t3_id = NodeId::new("fixture-t3");

    let mut doc = INode::new(doc_id.clone(), DOC);
    doc.content = Some(vec![p1_id.clone(), p2_id.clone()]);
    store.set_node(doc, false).unwrap();

    let mut p1 = INode::new(p1_id.clone(), PARAGRAPH);
    p1.parent_id = Some(doc_id.clone());
    p1.content = Some(vec![t1_id.clone(), t2_id.clone()]);
    store.set_node(p1, false).unwrap();

    let mut t1 = INode::new(t1_id.clone(), INLINE_TEXT);
    t1.parent_id = Some(p1_id.clone());
    t1.text = Some("Hello ".into());
    store.set_node(t1, false).unwrap();

    let mut t2 = INode::new(t2_id.clone(), INLINE_TEXT);
    t2.parent_id = Some(p1_id.clone());
    t2.text = Some("world".into());
    t2.marks = vec![docstore_types::Mark::new(BOLD, docstore_types::Range::new(0, 5))];
    store.set_node(t2, false).unwrap();

    let mut p2 = INode::new(p2_id.clone(), PARAGRAPH);
    p2.parent_id = Some(doc_id.clone());
    p2.content = Some(vec![t3_id.clone()]);
    store.set_node(p2, false).unwrap();

    let mut t3 = INode::new(t3_id.clone(), INLINE_TEXT);
    t3.parent_id = Some(p2_id.clone());
    t3.text = Some("Second paragraph.".into());
    store.set_node(t3, false).unwrap();

    SeedDocument {
        store,
        doc_id,
        p1_id,
        p2_id,
        t1_id,
        t2_id,
        t3_id,
    }
}

/// Named handles into the store built by [`seed_store`].
pub struct SeedDocument {
    pub store: NodeStore,
    pub doc_id: NodeId,
    pub p1_id: NodeId,
    pub p2_id: NodeId,
    pub t1_id: NodeId,
    pub t2_id: NodeId,
    pub t3_id: NodeId,
}
