//! The narrow contract between the interceptor and whatever records spans.

mod memory;
mod tracing_sink;

pub use memory::{MemorySink, RecordedSpan};
pub use tracing_sink::TracingSink;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::Metrics;

/// Everything a sink receives when a span opens.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SpanArgs {
    pub name: String,
    pub span_attributes: Map<String, Value>,
    pub input: Value,
    pub metadata: Map<String, Value>,
    /// Additional caller-provided fields (parent ids, tags, ...), passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpanArgs {
    /// Splits a merged argument object into the well-known fields and `extra`.
    pub fn from_object(mut fields: Map<String, Value>) -> Self {
        let name = match fields.remove("name") {
            Some(Value::String(name)) => name,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let span_attributes = take_object(&mut fields, "span_attributes");
        let metadata = take_object(&mut fields, "metadata");
        let input = fields.remove("input").unwrap_or(Value::Null);
        Self {
            name,
            span_attributes,
            input,
            metadata,
            extra: fields,
        }
    }

    /// The `type` span attribute, e.g. `"llm"`.
    pub fn span_type(&self) -> Option<&str> {
        self.span_attributes.get("type").and_then(Value::as_str)
    }
}

fn take_object(fields: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match fields.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// One `log` call on a span.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SpanLog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

impl SpanLog {
    pub fn metrics(metrics: Metrics) -> Self {
        Self {
            metrics: Some(metrics),
            output: None,
        }
    }

    pub fn output(output: Value) -> Self {
        Self {
            metrics: None,
            output: Some(output),
        }
    }

    pub fn new(metrics: Metrics, output: Value) -> Self {
        Self {
            metrics: Some(metrics),
            output: Some(output),
        }
    }
}

/// A span opened by a [`SpanSink`].
///
/// Calls happen from `Drop` when a stream is abandoned, so both methods are
/// synchronous and must not panic.
pub trait Span: Send {
    fn log(&mut self, entry: SpanLog);
    fn end(&mut self);
}

pub trait SpanSink: Send + Sync {
    fn start_span(&self, args: SpanArgs) -> Box<dyn Span>;
}

/// Sink that records nothing; used when tracing is disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

struct NoopSpan;

impl Span for NoopSpan {
    fn log(&mut self, _entry: SpanLog) {}
    fn end(&mut self) {}
}

impl SpanSink for NoopSink {
    fn start_span(&self, _args: SpanArgs) -> Box<dyn Span> {
        Box::new(NoopSpan)
    }
}

/// Owns an open span and ends it exactly once: on [`SpanGuard::end`] or on drop.
pub struct SpanGuard {
    span: Option<Box<dyn Span>>,
}

impl SpanGuard {
    pub fn new(span: Box<dyn Span>) -> Self {
        Self { span: Some(span) }
    }

    /// Logs on the span; ignored once the span has ended.
    pub fn log(&mut self, entry: SpanLog) {
        if let Some(span) = self.span.as_mut() {
            span.log(entry);
        }
    }

    pub fn end(&mut self) {
        if let Some(mut span) = self.span.take() {
            span.end();
        }
    }

    pub fn is_ended(&self) -> bool {
        self.span.is_none()
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.end();
    }
}
