//! Helpers for the logging boundary, where payloads must be valid JSON.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::TracewireError;

/// Converts `value` into a JSON value for logging.
///
/// Unlike fragment handling elsewhere in this crate, failure here is reported
/// instead of skipped: a sink must never receive a payload it cannot encode.
pub fn to_log_value<T>(value: &T) -> Result<Value, TracewireError>
where
    T: Serialize + ?Sized,
{
    serde_json::to_value(value).map_err(TracewireError::Serialization)
}

/// Recursively merges `overlay` into `base`. Nested objects are merged key by
/// key; every other overlay value replaces the base value.
pub fn merge_objects(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match value {
            Value::Object(incoming) => match base.get_mut(&key) {
                Some(Value::Object(existing)) => merge_objects(existing, incoming),
                _ => {
                    base.insert(key, Value::Object(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}
