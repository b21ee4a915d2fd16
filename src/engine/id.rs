//! Hierarchical check identifiers.
//!
//! Identifiers are dotted paths such as `"3"`, `"3.1"` and `"3.1.2"`. All
//! comparisons work on dot-delimited segments, so `"1.3"` is never treated
//! as a prefix of `"1.30"`.

use std::cmp::Ordering;

/// Split an identifier into its segments.
pub fn segments(id: &str) -> impl Iterator<Item = &str> {
    id.split('.')
}

/// Number of segments in an identifier (`"3.1"` has depth 2).
pub fn depth(id: &str) -> usize {
    segments(id).count()
}

/// Whether `id` is a well-formed identifier: non-empty alphanumeric
/// segments separated by single dots.
pub fn is_valid(id: &str) -> bool {
    !id.is_empty()
        && segments(id).all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Whether `ancestor` is a strict dotted-prefix ancestor of `descendant`.
pub fn is_ancestor(ancestor: &str, descendant: &str) -> bool {
    let mut outer = segments(descendant);
    for segment in segments(ancestor) {
        if outer.next() != Some(segment) {
            return false;
        }
    }
    outer.next().is_some()
}

/// Hierarchical ordering: numeric segments compare by value, so `"1.9"`
/// sorts before `"1.10"`. A parent sorts before its children.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = segments(a);
    let mut right = segments(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| l.cmp(r)),
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
