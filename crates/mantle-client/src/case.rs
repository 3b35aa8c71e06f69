//! Key casing helpers.

use serde_json::{Map, Value};

/// Convert a `snake_case` identifier to `camelCase`.
///
/// Leading underscores are kept, repeated underscores collapse, and
/// identifiers without underscores are returned unchanged.
#[must_use]
pub fn to_camel_case(key: &str) -> String {
    let prefix_len = key.len() - key.trim_start_matches('_').len();
    let (prefix, rest) = key.split_at(prefix_len);

    let mut out = String::with_capacity(key.len());
    out.push_str(prefix);

    let mut upper_next = false;
    for ch in rest.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Rename the top-level keys of a JSON object to `camelCase`.
///
/// Nested values are moved through untouched.
#[must_use]
pub fn camelize_keys(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (to_camel_case(&key), value))
        .collect()
}
