//! Mark records: typed annotations over a half-open range of a text node's `text`.

use serde::{Deserialize, Serialize};
use serde_json::Map;

/// Open attribute bag, shared by node attributes and mark attrs.
pub type Attrs = Map<String, serde_json::Value>;

/// A half-open `[start, end)` range into a node's `text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// `true` if the range contains no characters.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Clamp both endpoints into `[0, len]`.
    pub fn clamped(&self, len: usize) -> Self {
        Self {
            start: self.start.min(len),
            end: self.end.min(len),
        }
    }

    /// Whether two ranges are adjacent or overlapping (share at least a touching boundary).
    pub fn touches(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The union of two touching ranges.
    pub fn union(&self, other: &Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A typed annotation on a text node, e.g. bold over `[0, 5)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub stype: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Attrs,
    pub range: Range,
}

impl Mark {
    pub fn new(stype: impl Into<String>, range: Range) -> Self {
        Self {
            stype: stype.into(),
            attrs: Attrs::new(),
            range,
        }
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Two marks are "the same markup" when they share a type and attrs, ignoring range.
    pub fn same_markup(&self, other: &Mark) -> bool {
        self.stype == other.stype && self.attrs == other.attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_ranges_merge() {
        let a = Range::new(0, 5);
        let b = Range::new(5, 8);
        assert!(a.touches(&b));
        assert_eq!(a.union(&b), Range::new(0, 8));
    }

    #[test]
    fn disjoint_ranges_do_not_touch() {
        let a = Range::new(0, 3);
        let b = Range::new(4, 8);
        assert!(!a.touches(&b));
    }

    #[test]
    fn same_markup_ignores_range() {
        let a = Mark::new("bold", Range::new(0, 5));
        let b = Mark::new("bold", Range::new(2, 9));
        assert!(a.same_markup(&b));
    }
}
