//! JSON merging
//!
//! [`deep_merge`] is the general overlay merge: objects merge key by key, every
//! other value (arrays included) is replaced by the overlay. [`fill_missing`]
//! is the merge used when filling data from a schema: it only ever writes keys
//! the base does not have.

use serde_json::Value;

use crate::path;

/// Merge `overlay` into a copy of `base`.
///
/// Objects merge recursively; arrays and leaves in `overlay` replace the value
/// in `base` outright. Neither input is modified.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    let (Value::Object(base_map), Value::Object(overlay_map)) = (base, overlay) else {
        return overlay.clone();
    };

    let mut result = base_map.clone();
    for (key, value) in overlay_map {
        let merged = match (result.get(key), value) {
            (Some(existing @ Value::Object(_)), Value::Object(_)) => deep_merge(existing, value),
            _ => value.clone(),
        };
        result.insert(key.clone(), merged);
    }
    Value::Object(result)
}

/// Write the parts of `skeleton` that `base` is missing.
///
/// A key is written only when it is absent or `null` in `base`; when both sides
/// hold objects the merge recurses. Present leaves and arrays are never
/// replaced. Every written path (relative to `at`) is appended to `added`.
pub fn fill_missing(base: &mut Value, skeleton: Value, at: &str, added: &mut Vec<String>) {
    if base.is_null() {
        if !skeleton.is_null() {
            *base = skeleton;
            added.push(path::display(at));
        }
        return;
    }

    let (Value::Object(base_map), Value::Object(skeleton_map)) = (base, skeleton) else {
        return;
    };

    for (key, value) in skeleton_map {
        let child = path::key(at, &key);
        match base_map.get_mut(&key) {
            Some(existing) if !existing.is_null() => fill_missing(existing, value, &child, added),
            Some(existing) => {
                *existing = value;
                added.push(child);
            }
            None => {
                base_map.insert(key, value);
                added.push(child);
            }
        }
    }
}
