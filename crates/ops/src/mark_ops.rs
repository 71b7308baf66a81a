//! C6: mark normalization, merging, clamping, toggling.

use docstore_store::MutableStore;
use docstore_types::{Mark, NodeId, NodePatch, Range};
use std::collections::HashMap;

/// Normalize a mark list against a text of length `len`: fill missing ranges,
/// clamp to bounds, drop empty/duplicate marks, merge touching marks of the
/// same `(stype, attrs)`, sort by start ascending.
pub fn normalize(marks: &[Mark], len: usize) -> Vec<Mark> {
    let mut filled: Vec<Mark> = marks
        .iter()
        .map(|m| {
            let mut m = m.clone();
            m.range = m.range.clamped(len);
            m
        })
        .filter(|m| !m.range.is_empty())
        .collect();

    filled.sort_by_key(|m| m.range.start);

    let mut deduped: Vec<Mark> = Vec::new();
    for mark in filled {
        if deduped.iter().any(|m| m == &mark) {
            continue;
        }
        deduped.push(mark);
    }

    // Group by markup first so touching marks merge against every prior entry
    // of the same (stype, attrs), not just the immediately preceding mark —
    // an unrelated mark sitting between two same-markup marks in sort order
    // must not block the merge.
    let mut groups: Vec<Vec<Mark>> = Vec::new();
    'marks: for mark in deduped {
        for group in &mut groups {
            if group[0].same_markup(&mark) {
                group.push(mark);
                continue 'marks;
            }
        }
        groups.push(vec![mark]);
    }

    let mut merged: Vec<Mark> = Vec::new();
    for mut group in groups {
        group.sort_by_key(|m| m.range.start);
        let mut run: Vec<Mark> = Vec::new();
        for mark in group {
            if let Some(last) = run.last_mut() {
                if last.range.touches(&mark.range) {
                    last.range = last.range.union(&mark.range);
                    continue;
                }
            }
            run.push(mark);
        }
        merged.extend(run);
    }

    merged.sort_by_key(|m| m.range.start);
    merged
}

/// Per-node mark statistics, computed on the *un*normalized list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkStatistics {
    pub total_marks: usize,
    pub mark_types: HashMap<String, usize>,
    pub overlapping_marks: usize,
    pub empty_marks: usize,
}

pub fn mark_statistics(marks: &[Mark]) -> MarkStatistics {
    let mut stats = MarkStatistics {
        total_marks: marks.len(),
        ..Default::default()
    };
    for mark in marks {
        *stats.mark_types.entry(mark.stype.clone()).or_insert(0) += 1;
        if mark.range.is_empty() {
            stats.empty_marks += 1;
        }
    }
    for (i, a) in marks.iter().enumerate() {
        for b in &marks[i + 1..] {
            if a.range.touches(&b.range) && a.range != b.range {
                stats.overlapping_marks += 1;
            }
        }
    }
    stats
}

/// Mark operations bound to one node, routed through a [`MutableStore`].
pub struct MarkOps<'s, S: MutableStore + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: MutableStore + ?Sized> MarkOps<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Replace `node_id`'s marks, normalizing first unless `normalize` is `false`.
    /// Emits `update` only if the resulting list differs from the current one.
    pub fn set_marks(&mut self, node_id: &NodeId, marks: Vec<Mark>, should_normalize: bool) {
        let len = self.store.get(node_id).and_then(|n| n.text).map(|t| t.chars().count()).unwrap_or(0);
        let marks = if should_normalize { normalize(&marks, len) } else { marks };
        self.store.update(node_id, NodePatch::with_marks(marks));
    }

    /// Drop marks with an empty range; returns the count removed.
    pub fn remove_empty_marks(&mut self, node_id: &NodeId) -> usize {
        let Some(node) = self.store.get(node_id) else {
            return 0;
        };
        let before = node.marks.len();
        let kept: Vec<Mark> = node.marks.into_iter().filter(|m| !m.range.is_empty()).collect();
        let removed = before - kept.len();
        if removed > 0 {
            self.store.update(node_id, NodePatch::with_marks(kept));
        }
        removed
    }

    pub fn get_mark_statistics(&self, node_id: &NodeId) -> MarkStatistics {
        self.store
            .get(node_id)
            .map(|n| mark_statistics(&n.marks))
            .unwrap_or_default()
    }

    /// If a mark with the same `stype`/`attrs` covers `mark.range` exactly,
    /// remove it; otherwise apply it. Either way emits an `update` — an
    /// exact-match toggle-off still counts as an observable change.
    pub fn toggle_mark(&mut self, node_id: &NodeId, mark: Mark) {
        let Some(node) = self.store.get(node_id) else {
            return;
        };
        let exists = node
            .marks
            .iter()
            .any(|m| m.same_markup(&mark) && m.range == mark.range);
        let marks = if exists {
            node.marks.into_iter().filter(|m| !(m.same_markup(&mark) && m.range == mark.range)).collect()
        } else {
            let mut marks = node.marks;
            marks.push(mark);
            marks
        };
        self.store.update(node_id, NodePatch::with_marks(marks));
    }

    /// Add `mark` to `node_id`'s marks and renormalize against its text length.
    pub fn apply_mark(&mut self, node_id: &NodeId, mark: Mark) {
        let Some(node) = self.store.get(node_id) else {
            return;
        };
        let len = node.text.as_deref().map(|t| t.chars().count()).unwrap_or(0);
        let mut marks = node.marks;
        marks.push(mark);
        self.store.update(node_id, NodePatch::with_marks(normalize(&marks, len)));
    }

    /// Remove every mark of the given `stype` from `node_id`.
    pub fn remove_mark(&mut self, node_id: &NodeId, stype: &str) {
        let Some(node) = self.store.get(node_id) else {
            return;
        };
        let marks: Vec<Mark> = node.marks.into_iter().filter(|m| m.stype != stype).collect();
        self.store.update(node_id, NodePatch::with_marks(marks));
    }

    /// Clamp every mark on `node_id` to `range`, dropping any that fall entirely outside it.
    pub fn constrain_marks_to_range(&mut self, node_id: &NodeId, range: Range) {
        let Some(node) = self.store.get(node_id) else {
            return;
        };
        let marks: Vec<Mark> = node
            .marks
            .into_iter()
            .filter_map(|m| {
                let start = m.range.start.max(range.start);
                let end = m.range.end.min(range.end);
                if start >= end {
                    None
                } else {
                    Some(Mark { range: Range::new(start, end), ..m })
                }
            })
            .collect();
        self.store.update(node_id, NodePatch::with_marks(marks));
    }
}
