//! C7: text range operations and block split/merge.

use crate::error::OpsError;
use crate::mark_ops::MarkOps;
use docstore_store::{MutableStore, StoreError};
use docstore_types::{Attrs, Mark, NodeId, NodePatch, Range};
use regex::Regex;

/// A text selection: a pair of node/offset endpoints. Offsets index the
/// referenced text nodes' `text` in Unicode scalar values, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub start_node_id: NodeId,
    pub start_offset: usize,
    pub end_node_id: NodeId,
    pub end_offset: usize,
}

impl ModelSelection {
    pub fn single(node_id: NodeId, start_offset: usize, end_offset: usize) -> Self {
        Self {
            start_node_id: node_id.clone(),
            start_offset,
            end_node_id: node_id,
            end_offset,
        }
    }

    pub fn collapsed(node_id: NodeId, offset: usize) -> Self {
        Self::single(node_id, offset, offset)
    }

    fn is_single_node(&self) -> bool {
        self.start_node_id == self.end_node_id
    }
}

fn document_order_text_nodes<S: MutableStore + ?Sized>(store: &S) -> Vec<NodeId> {
    let mut result = Vec::new();
    if let Some(root_id) = store.root_id() {
        walk_text_nodes(store, &root_id, &mut result);
    }
    result
}

fn walk_text_nodes<S: MutableStore + ?Sized>(store: &S, id: &NodeId, out: &mut Vec<NodeId>) {
    let Some(node) = store.get(id) else { return };
    if node.text.is_some() {
        out.push(id.clone());
    }
    for child in node.children() {
        walk_text_nodes(store, child, out);
    }
}

/// Resolve a selection to the ordered list of text nodes it spans, or `None`
/// if the selection is invalid (missing node, non-text node, or — for
/// single-node selections — out-of-order/out-of-bounds offsets).
fn resolve_range_nodes<S: MutableStore + ?Sized>(store: &S, sel: &ModelSelection) -> Option<Vec<NodeId>> {
    let start_node = store.get(&sel.start_node_id)?;
    start_node.text.as_ref()?;

    if sel.is_single_node() {
        let len = start_node.text.as_ref().unwrap().chars().count();
        if sel.start_offset <= sel.end_offset && sel.end_offset <= len {
            return Some(vec![sel.start_node_id.clone()]);
        }
        return None;
    }

    let end_node = store.get(&sel.end_node_id)?;
    end_node.text.as_ref()?;

    let order = document_order_text_nodes(store);
    let start_idx = order.iter().position(|id| id == &sel.start_node_id)?;
    let end_idx = order.iter().position(|id| id == &sel.end_node_id)?;
    if start_idx > end_idx {
        return None;
    }
    Some(order[start_idx..=end_idx].to_vec())
}

fn apply_text_and_marks<S: MutableStore + ?Sized>(store: &mut S, id: &NodeId, text: String, marks: Vec<Mark>) {
    let mut patch = NodePatch::with_text(Some(text));
    patch.marks = Some(marks);
    store.update(id, patch);
}

/// Adjust a mark's range for a deletion of `[del_start, del_end)`. Returns
/// `None` if the mark collapses to empty. See Design Notes "Range operations
/// across marks": left of the deletion is unchanged, right shifts by the
/// deleted length, straddling marks clamp to the deletion boundary.
fn shift_range_for_deletion(range: Range, del_start: usize, del_end: usize) -> Option<Range> {
    let removed = del_end - del_start;
    let new_start = if range.start >= del_end {
        range.start - removed
    } else if range.start >= del_start {
        del_start
    } else {
        range.start
    };
    let new_end = if range.end >= del_end {
        range.end - removed
    } else if range.end >= del_start {
        del_start
    } else {
        range.end
    };
    if new_start >= new_end {
        None
    } else {
        Some(Range::new(new_start, new_end))
    }
}

/// Adjust a mark's range for an insertion of `len` characters at `at`. A mark
/// whose start is at-or-after `at` moves with the insertion; a mark
/// straddling `at` grows to absorb the inserted text.
fn shift_range_for_insertion(range: Range, at: usize, len: usize) -> Range {
    let start = if range.start >= at { range.start + len } else { range.start };
    let end = if range.end >= at { range.end + len } else { range.end };
    Range::new(start, end)
}

/// Delete the text spanned by `sel` (possibly across several text nodes in
/// document order) and return the deleted substring. Invalid ranges no-op
/// and return an empty string.
pub fn delete_text<S: MutableStore + ?Sized>(store: &mut S, sel: &ModelSelection) -> String {
    let Some(nodes) = resolve_range_nodes(store, sel) else {
        return String::new();
    };

    let mut deleted = String::new();
    let last = nodes.len() - 1;
    for (i, id) in nodes.iter().enumerate() {
        let node = store.get(id).expect("resolved node must exist");
        let text = node.text.clone().unwrap_or_default();
        let chars: Vec<char> = text.chars().collect();

        let (span_start, span_end) = if nodes.len() == 1 {
            (sel.start_offset.min(chars.len()), sel.end_offset.min(chars.len()))
        } else if i == 0 {
            (sel.start_offset.min(chars.len()), chars.len())
        } else if i == last {
            (0, sel.end_offset.min(chars.len()))
        } else {
            (0, chars.len())
        };

        deleted.push_str(&chars[span_start..span_end].iter().collect::<String>());

        let mut kept = chars[..span_start].to_vec();
        kept.extend_from_slice(&chars[span_end..]);
        let marks = node
            .marks
            .iter()
            .filter_map(|m| shift_range_for_deletion(m.range, span_start, span_end).map(|r| Mark { range: r, ..m.clone() }))
            .collect();
        apply_text_and_marks(store, id, kept.into_iter().collect(), marks);
    }
    deleted
}

/// Insert `s` at `offset` in `node_id`'s text. Marks at or after `offset`
/// shift right by `s`'s length; marks straddling `offset` absorb it.
pub fn insert_text<S: MutableStore + ?Sized>(store: &mut S, node_id: &NodeId, offset: usize, s: &str) {
    let Some(node) = store.get(node_id) else { return };
    let Some(text) = &node.text else { return };
    let chars: Vec<char> = text.chars().collect();
    let offset = offset.min(chars.len());
    let inserted_len = s.chars().count();

    let mut new_chars = chars[..offset].to_vec();
    new_chars.extend(s.chars());
    new_chars.extend_from_slice(&chars[offset..]);

    let marks = node
        .marks
        .iter()
        .map(|m| Mark {
            range: shift_range_for_insertion(m.range, offset, inserted_len),
            ..m.clone()
        })
        .collect();
    apply_text_and_marks(store, node_id, new_chars.into_iter().collect(), marks);
}

/// Delete `sel` then insert `s` at the collapsed start position. Returns the
/// deleted substring.
pub fn replace_text<S: MutableStore + ?Sized>(store: &mut S, sel: &ModelSelection, s: &str) -> String {
    if resolve_range_nodes(store, sel).is_none() {
        return String::new();
    }
    let deleted = delete_text(store, sel);
    if !s.is_empty() {
        insert_text(store, &sel.start_node_id, sel.start_offset, s);
    }
    deleted
}

/// Return the text spanned by `sel` without mutating the store.
pub fn extract_text<S: MutableStore + ?Sized>(store: &S, sel: &ModelSelection) -> String {
    let Some(nodes) = resolve_range_nodes(store, sel) else {
        return String::new();
    };
    let mut result = String::new();
    let last = nodes.len() - 1;
    for (i, id) in nodes.iter().enumerate() {
        let node = store.get(id).expect("resolved node must exist");
        let text = node.text.unwrap_or_default();
        let chars: Vec<char> = text.chars().collect();
        let (s, e) = if nodes.len() == 1 {
            (sel.start_offset.min(chars.len()), sel.end_offset.min(chars.len()))
        } else if i == 0 {
            (sel.start_offset.min(chars.len()), chars.len())
        } else if i == last {
            (0, sel.end_offset.min(chars.len()))
        } else {
            (0, chars.len())
        };
        result.push_str(&chars[s..e].iter().collect::<String>());
    }
    result
}

pub fn copy_text<S: MutableStore + ?Sized>(store: &S, sel: &ModelSelection) -> String {
    extract_text(store, sel)
}

pub fn get_text_length<S: MutableStore + ?Sized>(store: &S, sel: &ModelSelection) -> usize {
    extract_text(store, sel).chars().count()
}

/// Delete `from`, insert the deleted text at `to_node`/`to_offset`. When `to`
/// falls on the same node as `from` and after it, the offset is reinterpreted
/// against the post-deletion text.
pub fn move_text<S: MutableStore + ?Sized>(store: &mut S, from: &ModelSelection, to_node: &NodeId, to_offset: usize) -> String {
    let deleted = delete_text(store, from);
    let adjusted_offset = if *to_node == from.start_node_id && to_offset > from.start_offset {
        let removed_len = from.end_offset.saturating_sub(from.start_offset);
        to_offset.saturating_sub(removed_len)
    } else {
        to_offset
    };
    insert_text(store, to_node, adjusted_offset, &deleted);
    deleted
}

/// Return the text spanned by `sel` and insert a copy of it directly after the range.
pub fn duplicate_text<S: MutableStore + ?Sized>(store: &mut S, sel: &ModelSelection) -> String {
    let text = extract_text(store, sel);
    insert_text(store, &sel.end_node_id, sel.end_offset, &text);
    text
}

pub fn wrap<S: MutableStore + ?Sized>(store: &mut S, node_id: &NodeId, left: &str, right: &str) {
    let Some(node) = store.get(node_id) else { return };
    let Some(text) = &node.text else { return };
    let new_text = format!("{left}{text}{right}");
    let shift = left.chars().count();
    let marks = node
        .marks
        .iter()
        .map(|m| Mark {
            range: Range::new(m.range.start + shift, m.range.end + shift),
            ..m.clone()
        })
        .collect();
    apply_text_and_marks(store, node_id, new_text, marks);
}

pub fn unwrap<S: MutableStore + ?Sized>(store: &mut S, node_id: &NodeId, left: &str, right: &str) {
    let Some(node) = store.get(node_id) else { return };
    let Some(text) = &node.text else { return };
    if !text.starts_with(left) || !text.ends_with(right) || text.len() < left.len() + right.len() {
        return;
    }
    let inner = text[left.len()..text.len() - right.len()].to_string();
    let shift = left.chars().count();
    let marks = node
        .marks
        .iter()
        .filter_map(|m| {
            let start = m.range.start.saturating_sub(shift);
            let end = m.range.end.saturating_sub(shift);
            if start >= end {
                None
            } else {
                Some(Mark { range: Range::new(start, end), ..m.clone() })
            }
        })
        .collect();
    apply_text_and_marks(store, node_id, inner, marks);
}

pub fn indent<S: MutableStore + ?Sized>(store: &mut S, node_id: &NodeId, prefix: &str) {
    let Some(node) = store.get(node_id) else { return };
    let Some(text) = &node.text else { return };
    let new_text = text.lines().map(|line| format!("{prefix}{line}")).collect::<Vec<_>>().join("\n");
    apply_text_and_marks(store, node_id, new_text, node.marks.clone());
}

pub fn outdent<S: MutableStore + ?Sized>(store: &mut S, node_id: &NodeId, prefix: &str) {
    let Some(node) = store.get(node_id) else { return };
    let Some(text) = &node.text else { return };
    let new_text = text
        .lines()
        .map(|line| line.strip_prefix(prefix).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n");
    apply_text_and_marks(store, node_id, new_text, node.marks.clone());
}

pub fn find_text<S: MutableStore + ?Sized>(store: &S, node_id: &NodeId, needle: &str) -> Vec<usize> {
    let Some(node) = store.get(node_id) else { return Vec::new() };
    let Some(text) = &node.text else { return Vec::new() };
    if needle.is_empty() {
        return Vec::new();
    }
    text.match_indices(needle).map(|(byte_idx, _)| text[..byte_idx].chars().count()).collect()
}

pub fn find_all<S: MutableStore + ?Sized>(store: &S, node_id: &NodeId, pattern: &Regex) -> Vec<Range> {
    let Some(node) = store.get(node_id) else { return Vec::new() };
    let Some(text) = &node.text else { return Vec::new() };
    pattern
        .find_iter(text)
        .map(|m| Range::new(text[..m.start()].chars().count(), text[..m.end()].chars().count()))
        .collect()
}

pub fn replace<S: MutableStore + ?Sized>(store: &mut S, node_id: &NodeId, pattern: &Regex, replacement: &str) {
    let Some(node) = store.get(node_id) else { return };
    let Some(text) = &node.text else { return };
    let new_text = pattern.replace_all(text, replacement).into_owned();
    apply_text_and_marks(store, node_id, new_text, node.marks.clone());
}

pub fn trim_text<S: MutableStore + ?Sized>(store: &mut S, node_id: &NodeId) {
    let Some(node) = store.get(node_id) else { return };
    let Some(text) = &node.text else { return };
    apply_text_and_marks(store, node_id, text.trim().to_string(), node.marks.clone());
}

pub fn normalize_whitespace<S: MutableStore + ?Sized>(store: &mut S, node_id: &NodeId) {
    let Some(node) = store.get(node_id) else { return };
    let Some(text) = &node.text else { return };
    let collapse = Regex::new(r"\s+").expect("static pattern");
    let new_text = collapse.replace_all(text.trim(), " ").into_owned();
    apply_text_and_marks(store, node_id, new_text, node.marks.clone());
}

pub fn apply_mark<S: MutableStore + ?Sized>(store: &mut S, node_id: &NodeId, mark: Mark) {
    MarkOps::new(store).apply_mark(node_id, mark);
}

pub fn remove_mark<S: MutableStore + ?Sized>(store: &mut S, node_id: &NodeId, stype: &str) {
    MarkOps::new(store).remove_mark(node_id, stype);
}

pub fn toggle_mark<S: MutableStore + ?Sized>(store: &mut S, node_id: &NodeId, mark: Mark) {
    MarkOps::new(store).toggle_mark(node_id, mark);
}

pub fn constrain_marks_to_range<S: MutableStore + ?Sized>(store: &mut S, node_id: &NodeId, range: Range) {
    MarkOps::new(store).constrain_marks_to_range(node_id, range);
}

/// Grow `range` to the nearest Unicode word (`\w+`) boundaries it overlaps.
pub fn expand_to_word<S: MutableStore + ?Sized>(store: &S, node_id: &NodeId, range: Range) -> Range {
    let Some(node) = store.get(node_id) else { return range };
    let Some(text) = &node.text else { return range };
    let word = Regex::new(r"\w+").expect("static pattern");
    let mut result = range;
    for m in word.find_iter(text) {
        let start = text[..m.start()].chars().count();
        let end = text[..m.end()].chars().count();
        if start < result.end && end > result.start {
            result = Range::new(result.start.min(start), result.end.max(end));
        }
    }
    result
}

/// Swap a range's endpoints if it is reversed.
pub fn normalize_range(range: Range) -> Range {
    if range.start > range.end {
        Range::new(range.end, range.start)
    } else {
        range
    }
}

/// Split `block_id`'s children at `pos` (strictly interior) into a new
/// sibling block of the same type, inserted immediately after `block_id`.
pub fn split_block_node<S: MutableStore + ?Sized>(store: &mut S, block_id: &NodeId, pos: usize) -> Result<NodeId, OpsError> {
    let block = store.get(block_id).ok_or_else(|| OpsError::Store(StoreError::NodeNotFound(block_id.clone())))?;
    let children = block.children().to_vec();
    if pos == 0 || pos >= children.len() {
        return Err(OpsError::InvalidSplitPosition(pos));
    }
    let parent_id = block
        .parent_id
        .clone()
        .ok_or_else(|| OpsError::Store(StoreError::NodeNotFound(block_id.clone())))?;
    let parent = store.get(&parent_id).ok_or_else(|| OpsError::Store(StoreError::NodeNotFound(parent_id.clone())))?;

    let moved_children: Vec<NodeId> = children[pos..].to_vec();
    let kept_children: Vec<NodeId> = children[..pos].to_vec();

    let new_block_id = store.next_id();
    let new_block = docstore_types::INode {
        sid: new_block_id.clone(),
        stype: block.stype.clone(),
        attributes: Attrs::new(),
        text: None,
        content: Some(moved_children.clone()),
        parent_id: Some(parent_id.clone()),
        marks: Vec::new(),
    };
    store.create(new_block)?;

    store.update(block_id, NodePatch::with_content(kept_children));
    for child in &moved_children {
        store.update(child, NodePatch::with_parent(Some(new_block_id.clone())));
    }

    let mut parent_content = parent.children().to_vec();
    let insert_at = parent_content.iter().position(|id| id == block_id).map_or(parent_content.len(), |i| i + 1);
    parent_content.insert(insert_at, new_block_id.clone());
    store.update(&parent_id, NodePatch::with_content(parent_content));

    Ok(new_block_id)
}

/// Append `right`'s children onto `left`, reparent them, and delete `right`.
/// Both nodes must be siblings of the same `stype`.
pub fn merge_block_nodes<S: MutableStore + ?Sized>(store: &mut S, left_id: &NodeId, right_id: &NodeId) -> Result<(), OpsError> {
    let left = store.get(left_id).ok_or_else(|| OpsError::Store(StoreError::NodeNotFound(left_id.clone())))?;
    let right = store.get(right_id).ok_or_else(|| OpsError::Store(StoreError::NodeNotFound(right_id.clone())))?;

    if left.parent_id != right.parent_id {
        return Err(OpsError::NotSiblings(left_id.clone(), right_id.clone()));
    }
    if left.stype != right.stype {
        return Err(OpsError::TypeMismatch(left_id.clone(), right_id.clone()));
    }

    let mut content = left.children().to_vec();
    let right_children = right.children().to_vec();
    content.extend(right_children.iter().cloned());
    store.update(left_id, NodePatch::with_content(content));
    for child in &right_children {
        store.update(child, NodePatch::with_parent(Some(left_id.clone())));
    }

    if let Some(parent_id) = &right.parent_id {
        if let Some(parent) = store.get(parent_id) {
            let mut parent_content = parent.children().to_vec();
            parent_content.retain(|id| id != right_id);
            store.update(parent_id, NodePatch::with_content(parent_content));
        }
    }

    store.delete(right_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_store::NodeStore;
    use docstore_types::INode;

    fn doc_with_two_text_nodes() -> (NodeStore, NodeId, NodeId, NodeId) {
        let mut store = NodeStore::new(1);
        let doc_id = NodeId::new("doc");
        let t1 = NodeId::new("t1");
        let t2 = NodeId::new("t2");
        let mut doc = INode::new(doc_id.clone(), "doc");
        doc.content = Some(vec![t1.clone(), t2.clone()]);
        store.set_node(doc, false).unwrap();
        let mut n1 = INode::new(t1.clone(), "inline-text");
        n1.parent_id = Some(doc_id.clone());
        n1.text = Some("Hello".into());
        store.set_node(n1, false).unwrap();
        let mut n2 = INode::new(t2.clone(), "inline-text");
        n2.parent_id = Some(doc_id.clone());
        n2.text = Some(" World".into());
        store.set_node(n2, false).unwrap();
        (store, doc_id, t1, t2)
    }

    #[test]
    fn replace_text_across_two_nodes() {
        let (mut store, _doc, t1, t2) = doc_with_two_text_nodes();
        let sel = ModelSelection {
            start_node_id: t1.clone(),
            start_offset: 0,
            end_node_id: t2.clone(),
            end_offset: 6,
        };
        replace_text(&mut store, &sel, "Hi!");
        assert_eq!(store.get_node(&t1).unwrap().text.as_deref(), Some("Hi!"));
        assert_eq!(store.get_node(&t2).unwrap().text.as_deref(), Some(""));
    }

    #[test]
    fn replace_text_on_an_invalid_selection_is_a_no_op() {
        let (mut store, _doc, t1, _t2) = doc_with_two_text_nodes();
        let sel = ModelSelection {
            start_node_id: t1.clone(),
            start_offset: 3,
            end_node_id: t1.clone(),
            end_offset: 1,
        };
        let result = replace_text(&mut store, &sel, "Hi!");
        assert_eq!(result, "");
        assert_eq!(store.get_node(&t1).unwrap().text.as_deref(), Some("Hello"), "invalid range must not mutate the node");
    }

    #[test]
    fn normalize_marks_merges_bold_across_word() {
        let mut marks = vec![
            Mark::new("bold", Range::new(0, 11)),
            Mark::new("italic", Range::new(0, 5)),
        ];
        marks = crate::mark_ops::normalize(&marks, 11);
        assert_eq!(marks.len(), 2);
    }

    #[test]
    fn toggle_exact_mark_removes_it() {
        let (mut store, _doc, t1, _t2) = doc_with_two_text_nodes();
        store.update(&t1, NodePatch::with_marks(vec![Mark::new("bold", Range::new(0, 5))]));
        store.take_pending_ops();
        toggle_mark(&mut store, &t1, Mark::new("bold", Range::new(0, 5)));
        let ops = store.take_pending_ops();
        assert_eq!(ops.len(), 1, "an exact-match toggle-off still emits an update");
        assert!(store.get_node(&t1).unwrap().marks.is_empty());
    }

    #[test]
    fn split_block_node_requires_interior_position() {
        let mut store = NodeStore::new(1);
        let doc_id = NodeId::new("doc");
        let p1 = NodeId::new("p1");
        let mut doc = INode::new(doc_id.clone(), "doc");
        doc.content = Some(vec![p1.clone()]);
        store.set_node(doc, false).unwrap();

        let a = NodeId::new("a");
        let b = NodeId::new("b");
        let c = NodeId::new("c");
        let mut block = INode::new(p1.clone(), "paragraph");
        block.parent_id = Some(doc_id.clone());
        block.content = Some(vec![a.clone(), b.clone(), c.clone()]);
        store.set_node(block, false).unwrap();
        for child in [&a, &b, &c] {
            let mut n = INode::new((*child).clone(), "inline-text");
            n.parent_id = Some(p1.clone());
            store.set_node(n, false).unwrap();
        }

        assert!(split_block_node(&mut store, &p1, 0).is_err());
        assert!(split_block_node(&mut store, &p1, 3).is_err());

        let new_block = split_block_node(&mut store, &p1, 1).unwrap();
        assert_eq!(store.get_node(&p1).unwrap().children(), &[a.clone()]);
        assert_eq!(store.get_node(&new_block).unwrap().children(), &[b.clone(), c.clone()]);
        assert_eq!(store.get_node(&b).unwrap().parent_id, Some(new_block.clone()));
        assert_eq!(store.get_node(&doc_id).unwrap().children(), &[p1.clone(), new_block]);
    }
}
