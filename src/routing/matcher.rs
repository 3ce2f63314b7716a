//! Route matching logic.
//!
//! # Responsibilities
//! - Compare a concrete request path against a registered pattern
//! - Rank competing matches so literal segments beat parameters
//!
//! # Design Decisions
//! - Segment counts must be equal: no variable-length wildcards or
//!   trailing catch-alls
//! - Literal segments are case-sensitive
//! - No regex to guarantee O(segments) matching

use std::cmp::Ordering;

use crate::routing::pattern::{RoutePattern, Segment};

/// Returns true if `concrete_path` has the shape of `pattern`.
///
/// `concrete_path` must already be stripped of its query string.
pub fn matches(concrete_path: &str, pattern: &RoutePattern) -> bool {
    let segments = pattern.segments();
    let mut concrete = concrete_path.split('/');

    for segment in segments {
        let Some(part) = concrete.next() else {
            return false;
        };
        if let Segment::Literal(literal) = segment {
            if literal != part {
                return false;
            }
        }
    }

    // Pattern exhausted; the path must be too.
    concrete.next().is_none()
}

/// Same as [`matches`] but parses the pattern on the fly.
///
/// Invalid patterns never match.
pub fn matches_str(concrete_path: &str, pattern: &str) -> bool {
    RoutePattern::parse(pattern)
        .map(|p| matches(concrete_path, &p))
        .unwrap_or(false)
}

/// Precedence between two patterns that both matched the same path.
///
/// Walks the segments left to right; at the first position where one
/// pattern has a literal and the other a parameter, the literal wins.
/// `Ordering::Greater` means `a` is more specific than `b`.
pub fn compare_specificity(a: &RoutePattern, b: &RoutePattern) -> Ordering {
    for (left, right) in a.segments().iter().zip(b.segments()) {
        match (left.is_param(), right.is_param()) {
            (false, true) => return Ordering::Greater,
            (true, false) => return Ordering::Less,
            _ => {}
        }
    }
    Ordering::Equal
}
