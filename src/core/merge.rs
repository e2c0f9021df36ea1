use serde_json::{Map, Value};

/// Deep-merges `overrides` into `result`.
///
/// Nested objects present on both sides are merged key by key; any other
/// value in `overrides` replaces what `result` holds at that key.
pub fn merge_dict(result: &mut Map<String, Value>, overrides: Map<String, Value>) {
    for (key, value) in overrides {
        match value {
            Value::Object(overlay) if matches!(result.get(&key), Some(Value::Object(_))) => {
                if let Some(Value::Object(base)) = result.get_mut(&key) {
                    merge_dict(base, overlay);
                }
            }
            value => {
                result.insert(key, value);
            }
        }
    }
}
