//! Recursive null removal, the final step of every record extraction.

use serde_json::Value;

/// Strip null object values and null array elements at every depth.
///
/// Empty objects and arrays survive; only nulls are erased.
pub(crate) fn prune_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, prune_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(prune_nulls)
                .collect(),
        ),
        scalar => scalar,
    }
}
