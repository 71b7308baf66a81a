//! End-to-end tests for the `DataStore` facade: transaction lifecycle,
//! subscriber notification, detach/reattach, and the cross-layer passthroughs.

use docstore_core::DataStore;
use docstore_test_support::{fixture_schema, DOC, INLINE_TEXT, PARAGRAPH};
use docstore_types::{INode, Mark, NodeId, NodeTemplate, Operation, Range, TemplateChild};
use std::cell::RefCell;
use std::rc::Rc;

/// `doc > paragraph > [inline-text("Hello "), inline-text("world", bold)]`,
/// seeded directly (no ops emitted) so tests start from a known shape.
fn seeded_store() -> (DataStore, NodeId, NodeId, NodeId, NodeId) {
    let mut store = DataStore::new(1, Some(fixture_schema()));

    let doc_id = NodeId::new("t-doc");
    let p1_id = NodeId::new("t-p1");
    let t1_id = NodeId::new("t-t1");
    let t2_id = NodeId::new("t-t2");

    let mut doc = INode::new(doc_id.clone(), DOC);
    doc.content = Some(vec![p1_id.clone()]);
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
    t2.marks = vec![Mark::new("bold", Range::new(0, 5))];
    store.set_node(t2, false).unwrap();

    (store, doc_id, p1_id, t1_id, t2_id)
}

#[test]
fn commit_applies_overlay_writes_and_returns_ops_in_order() {
    let (mut store, _doc, p1, t1, _t2) = seeded_store();
    store.begin().unwrap();
    let template = NodeTemplate {
        stype: INLINE_TEXT.into(),
        text: Some("!".into()),
        ..Default::default()
    };
    store.add_child(&p1, &template).unwrap();
    store.insert_text(&t1, 0, ">> ");

    assert_eq!(store.get_node(&t1).unwrap().text.as_deref(), Some("Hello "), "base untouched mid-transaction");

    let ops = store.commit().unwrap();
    assert_eq!(ops.len(), 3, "one create, one parent update from add_child, one update from insert_text");
    assert!(matches!(ops[0], Operation::Create { .. }));

    assert_eq!(store.get_node(&t1).unwrap().text.as_deref(), Some(">> Hello "));
    assert_eq!(store.get_node(&p1).unwrap().children().len(), 3);
}

#[test]
fn rollback_leaves_base_store_untouched() {
    let (mut store, _doc, _p1, t1, _t2) = seeded_store();
    store.begin().unwrap();
    store.insert_text(&t1, 0, "mutated: ");
    store.rollback();
    assert_eq!(store.get_node(&t1).unwrap().text.as_deref(), Some("Hello "));
}

#[test]
fn commit_without_a_transaction_is_a_no_op() {
    let (mut store, ..) = seeded_store();
    assert!(store.commit().unwrap().is_empty());
}

#[test]
fn second_begin_without_ending_the_first_errors() {
    let (mut store, ..) = seeded_store();
    store.begin().unwrap();
    assert!(store.begin().is_err());
}

#[test]
fn immediate_mode_mutation_notifies_subscribers_synchronously() {
    let (mut store, _doc, _p1, t1, _t2) = seeded_store();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = seen.clone();
    store.on_operation(Box::new(move |op| seen_clone.borrow_mut().push(op.node_id().clone())));

    store.insert_text(&t1, 0, "X");
    assert_eq!(seen.borrow().as_slice(), &[t1]);
}

#[test]
fn off_operation_stops_delivery() {
    let (mut store, _doc, _p1, t1, _t2) = seeded_store();
    let count = Rc::new(RefCell::new(0));
    let count_clone = count.clone();
    let id = store.on_operation(Box::new(move |_op| *count_clone.borrow_mut() += 1));

    store.insert_text(&t1, 0, "a");
    store.off_operation(id);
    store.insert_text(&t1, 0, "b");

    assert_eq!(*count.borrow(), 1);
}

#[test]
fn detach_guard_suppresses_and_then_restores_delivery() {
    let (mut store, _doc, _p1, t1, _t2) = seeded_store();
    let count = Rc::new(RefCell::new(0));
    let count_clone = count.clone();
    let id = store.on_operation(Box::new(move |_op| *count_clone.borrow_mut() += 1));

    {
        let mut guard = store.detach(id);
        guard.insert_text(&t1, 0, "during-detach: ");
    }
    assert_eq!(*count.borrow(), 0, "handler was detached for the scope of the guard");

    store.insert_text(&t1, 0, "after-reattach: ");
    assert_eq!(*count.borrow(), 1, "handler fires again once the guard drops");
}

#[test]
fn create_node_with_children_materializes_a_template_under_schema() {
    let (mut store, _doc, p1, ..) = seeded_store();
    let template = NodeTemplate {
        stype: PARAGRAPH.into(),
        content: vec![TemplateChild::Inline(Box::new(NodeTemplate {
            stype: INLINE_TEXT.into(),
            text: Some("fresh paragraph".into()),
            ..Default::default()
        }))],
        ..Default::default()
    };
    let new_id = store.create_node_with_children(&template).unwrap();
    let node = store.get_node(&new_id).unwrap();
    assert_eq!(node.stype, PARAGRAPH);
    assert_ne!(new_id, p1);
}

#[test]
fn delete_node_also_detaches_it_from_its_parents_content() {
    let (mut store, _doc, p1, t1, t2) = seeded_store();
    store.delete_node(&t1).unwrap();
    assert!(store.get_node(&t1).is_none());
    assert_eq!(store.get_node(&p1).unwrap().children(), &[t2]);
}

#[test]
fn traversal_passthrough_walks_document_order() {
    let (mut store, doc, p1, t1, t2) = seeded_store();
    assert_eq!(store.get_next_node(&doc).unwrap(), Some(p1));
    assert_eq!(store.get_next_node(&t1).unwrap(), Some(t2));
}

#[test]
fn traversal_without_a_schema_fails_with_no_schema() {
    let mut store = DataStore::new(1, None);
    let id = NodeId::new("x");
    store.set_node(INode::new(id.clone(), DOC), false).unwrap();
    assert!(matches!(store.get_next_node(&id), Err(docstore_core::DataStoreError::NoSchema)));
}
