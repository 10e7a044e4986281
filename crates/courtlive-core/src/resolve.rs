// ── Dot-path resolution ──
//
// Looks up a value inside a match payload. Every miss is `None`: missing
// keys, null intermediates, out-of-range indexes, and descending into a
// scalar all read as "no value" rather than failing.

use serde_json::Value;

/// Resolve a dot-separated `path` against `root`.
///
/// Objects are indexed by key, arrays by a numeric segment
/// (`sets.0.player1`). An empty path or an empty segment resolves to
/// `None`, as does a path that ends on `null`.
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    let mut current = root;
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}
