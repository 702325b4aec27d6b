//! Field-by-field merging of configuration tiers.
//!
//! Tier files are parsed into `serde_json::Value` and folded together before
//! deserializing into `Config`, so a tier only needs to mention the keys it
//! changes.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// Objects merge key by key; anything else in the overlay replaces the base
/// value. A `null` overlay means "not specified" and keeps the base.
///
/// ```
/// use serde_json::json;
/// use cognitask_mcp::config::deep_merge;
///
/// let base = json!({"tasks": {"breakdown_min": 3, "breakdown_max": 7}});
/// let overlay = json!({"tasks": {"breakdown_max": 5}});
/// assert_eq!(
///     deep_merge(base, overlay),
///     json!({"tasks": {"breakdown_min": 3, "breakdown_max": 5}})
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let next = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, next);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold tiers lowest-priority first.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
