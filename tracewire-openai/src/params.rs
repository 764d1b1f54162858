use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracewire_core::{merge_objects, CallKind, Redactor, SpanArgs};

pub const SPAN_INFO_KEY: &str = "span_info";
const STREAM_KEY: &str = "stream";

/// Keyword arguments of one provider call, e.g. `model`, `messages`, `stream`.
///
/// A `span_info` object may be included to override the span arguments; it is
/// removed before the parameters reach the endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallParams(Map<String, Value>);

impl CallParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The `stream` flag as requested by the caller, if it is a boolean.
    pub fn stream_requested(&self) -> Option<bool> {
        self.0.get(STREAM_KEY).and_then(Value::as_bool)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Removes `span_info`. Values that are not objects are discarded.
    pub(crate) fn take_span_info(&mut self) -> Map<String, Value> {
        match self.0.remove(SPAN_INFO_KEY) {
            Some(Value::Object(info)) => info,
            Some(other) => {
                tracing::debug!(span_info = %other, "ignoring span_info that is not an object");
                Map::new()
            }
            None => Map::new(),
        }
    }
}

impl From<Map<String, Value>> for CallParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for CallParams {
    type Error = Value;

    /// Only objects are call parameters; anything else is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// Span arguments for a call: derived name and type, overridden by
/// `span_info`, overridden by the call's input and remaining parameters.
pub(crate) fn span_args(
    kind: CallKind,
    span_info: Map<String, Value>,
    params: &CallParams,
    redactor: &Redactor,
) -> SpanArgs {
    let mut merged = object(json!({
        "name": kind.span_name(),
        "span_attributes": {"type": "llm"},
    }));
    merge_objects(&mut merged, span_info);

    let mut metadata = params.as_map().clone();
    let mut call_fields = Map::new();
    if let Some(input) = metadata.remove(kind.input_key()) {
        call_fields.insert("input".to_string(), input);
    }
    call_fields.insert("metadata".to_string(), Value::Object(metadata));
    merge_objects(&mut merged, call_fields);

    let mut args = SpanArgs::from_object(merged);
    args.input = redactor.apply(args.input);
    args.metadata = match redactor.apply(Value::Object(args.metadata)) {
        Value::Object(metadata) => metadata,
        _ => Map::new(),
    };
    args
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
