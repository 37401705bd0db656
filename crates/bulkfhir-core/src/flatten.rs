//! Deep flattening of nested records into single-level field maps.
//!
//! Used by the reshape layer as the fallback projection when no extraction
//! rules are registered for a resource type.

use indexmap::IndexMap;
use serde_json::Value;

/// A single-level mapping from field name to value, in key order.
pub type FlatRecord = IndexMap<String, Value>;

/// Flattens a nested record into a [`FlatRecord`].
///
/// Every leaf value's output key is the dot-joined path from the record
/// root; array elements get an index segment. `{"a": {"b": [1, 2]}}`
/// flattens to `a.b.0 -> 1, a.b.1 -> 2`. The key scheme is fixed; golden
/// outputs depend on it.
///
/// Empty objects and arrays contribute no keys. Key order follows document
/// order, so flattening is deterministic for a given record.
pub fn deep_flatten(record: &Value) -> FlatRecord {
    let mut flat = FlatRecord::new();
    flatten_into(record, String::new(), &mut flat);
    flat
}

fn flatten_into(value: &Value, prefix: String, out: &mut FlatRecord) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(child, path, out);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                let path = if prefix.is_empty() {
                    idx.to_string()
                } else {
                    format!("{prefix}.{idx}")
                };
                flatten_into(child, path, out);
            }
        }
        leaf => {
            out.insert(prefix, leaf.clone());
        }
    }
}
