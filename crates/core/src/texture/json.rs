//! Tolerant field access for JSON documents.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Reads `key` from `json` into `field`.
///
/// A missing or mistyped key logs a warning and leaves `field` untouched.
/// Returns whether the field was set.
pub fn json_safe_get<T: DeserializeOwned>(json: &Value, key: &str, field: &mut T) -> bool {
    let Some(value) = json.get(key) else {
        warn!("json_safe_get: missing key '{}'", key);
        return false;
    };

    match T::deserialize(value) {
        Ok(parsed) => {
            *field = parsed;
            true
        }
        Err(e) => {
            warn!("json_safe_get: could not read key '{}': {}", key, e);
            false
        }
    }
}
