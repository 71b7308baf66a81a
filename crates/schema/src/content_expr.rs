//! The content expression language: `T`, `T+`, `T*`, and alternation by `|`.

use std::fmt;

/// How many times a content expression's alternatives may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// `T` — exactly one.
    One,
    /// `T+` — one or more.
    OneOrMore,
    /// `T*` — zero or more.
    ZeroOrMore,
}

impl Quantifier {
    fn allows_count(&self, count: usize) -> bool {
        match self {
            Quantifier::One => count == 1,
            Quantifier::OneOrMore => count >= 1,
            Quantifier::ZeroOrMore => true,
        }
    }

    fn min(&self) -> usize {
        match self {
            Quantifier::One | Quantifier::OneOrMore => 1,
            Quantifier::ZeroOrMore => 0,
        }
    }
}

/// A parsed content expression, e.g. `"paragraph+"` or `"paragraph|heading"`.
///
/// Parsed once at schema-construction time and reused for every validation
/// call, rather than re-parsed from the source string each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentExpr {
    /// Node type or group names admissible in each slot.
    alternatives: Vec<String>,
    quantifier: Quantifier,
}

/// A content expression failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid content expression {0:?}")]
pub struct ContentExprParseError(pub String);

impl ContentExpr {
    /// Parse a content expression string.
    ///
    /// Grammar: `alt ("|" alt)* quantifier?` where `quantifier` is `+`, `*`, or absent (meaning
    /// exactly one).
    pub fn parse(src: &str) -> Result<Self, ContentExprParseError> {
        let trimmed = src.trim();
        if trimmed.is_empty() {
            return Err(ContentExprParseError(src.to_string()));
        }

        let (body, quantifier) = match trimmed.chars().last() {
            Some('+') => (&trimmed[..trimmed.len() - 1], Quantifier::OneOrMore),
            Some('*') => (&trimmed[..trimmed.len() - 1], Quantifier::ZeroOrMore),
            _ => (trimmed, Quantifier::One),
        };

        let alternatives: Vec<String> = body
            .split('|')
            .map(|s| s.trim().to_string())
            .collect();

        if alternatives.is_empty() || alternatives.iter().any(|a| a.is_empty()) {
            return Err(ContentExprParseError(src.to_string()));
        }

        Ok(Self {
            alternatives,
            quantifier,
        })
    }

    /// Whether a single child, identified by its own type name and the group
    /// that type belongs to, is admissible under this expression at all
    /// (ignores cardinality — used for incremental content ops, per the
    /// spec's note that full-expression cardinality is only checked at
    /// transaction-commit boundaries).
    pub fn admits(&self, child_type: &str, child_group: Option<&str>) -> bool {
        self.alternatives.iter().any(|alt| {
            alt == child_type || child_group.is_some_and(|g| g == alt)
        })
    }

    /// Whether a full ordered sequence of children satisfies this expression,
    /// both per-slot admissibility and overall cardinality.
    pub fn matches_sequence<'a>(
        &self,
        children: impl Iterator<Item = (&'a str, Option<&'a str>)>,
    ) -> bool {
        let mut count = 0usize;
        for (child_type, child_group) in children {
            if !self.admits(child_type, child_group) {
                return false;
            }
            count += 1;
        }
        self.quantifier.allows_count(count)
    }

    /// Minimum number of children this expression requires.
    pub fn min_children(&self) -> usize {
        self.quantifier.min()
    }
}

impl fmt::Display for ContentExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.alternatives.join("|"))?;
        match self.quantifier {
            Quantifier::One => Ok(()),
            Quantifier::OneOrMore => write!(f, "+"),
            Quantifier::ZeroOrMore => write!(f, "*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_one() {
        let expr = ContentExpr::parse("paragraph").unwrap();
        assert!(expr.admits("paragraph", None));
        assert!(!expr.admits("heading", None));
        assert!(expr.matches_sequence(std::iter::once(("paragraph", None))));
        assert!(!expr.matches_sequence(std::iter::empty()));
    }

    #[test]
    fn parses_one_or_more() {
        let expr = ContentExpr::parse("inline-text+").unwrap();
        assert!(!expr.matches_sequence(std::iter::empty()));
        assert!(expr.matches_sequence(
            [("inline-text", None), ("inline-text", None)].into_iter()
        ));
    }

    #[test]
    fn parses_zero_or_more() {
        let expr = ContentExpr::parse("image*").unwrap();
        assert!(expr.matches_sequence(std::iter::empty()));
    }

    #[test]
    fn parses_alternation() {
        let expr = ContentExpr::parse("paragraph|heading").unwrap();
        assert!(expr.admits("paragraph", None));
        assert!(expr.admits("heading", None));
        assert!(!expr.admits("image", None));
    }

    #[test]
    fn admits_by_group() {
        let expr = ContentExpr::parse("block+").unwrap();
        assert!(expr.admits("paragraph", Some("block")));
        assert!(!expr.admits("paragraph", Some("inline")));
    }

    #[test]
    fn rejects_empty_expression() {
        assert!(ContentExpr::parse("").is_err());
        assert!(ContentExpr::parse("a||b").is_err());
    }
}
