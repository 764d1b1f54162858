use std::time::Instant;

use serde_json::Value;

use super::{Span, SpanArgs, SpanLog, SpanSink};

/// Sink that reports spans through the `tracing` ecosystem.
///
/// Each call becomes an `llm.call` span carrying the GenAI usage fields
/// `gen_ai.usage.input_tokens` / `gen_ai.usage.output_tokens`, which are
/// filled in once usage metrics are logged. Logged metrics and outputs are
/// emitted as events inside the span.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl SpanSink for TracingSink {
    fn start_span(&self, args: SpanArgs) -> Box<dyn Span> {
        let metadata = Value::Object(args.metadata.clone());
        let span = tracing::info_span!(
            "llm.call",
            "otel.name" = %args.name,
            "span.type" = args.span_type().unwrap_or_default(),
            "gen_ai.usage.input_tokens" = tracing::field::Empty,
            "gen_ai.usage.output_tokens" = tracing::field::Empty,
            input = %args.input,
            metadata = %metadata,
        );
        Box::new(TracingSpan {
            span,
            started: Instant::now(),
        })
    }
}

struct TracingSpan {
    span: tracing::Span,
    started: Instant,
}

impl Span for TracingSpan {
    fn log(&mut self, entry: SpanLog) {
        if let Some(metrics) = &entry.metrics {
            if let Some(tokens) = metrics.get_u64("prompt_tokens") {
                self.span.record("gen_ai.usage.input_tokens", tokens);
            }
            if let Some(tokens) = metrics.get_u64("completion_tokens") {
                self.span.record("gen_ai.usage.output_tokens", tokens);
            }
        }

        let metrics = entry
            .metrics
            .map(|metrics| metrics.to_value())
            .unwrap_or(Value::Null);
        let output = entry.output.unwrap_or(Value::Null);
        tracing::info!(
            parent: &self.span,
            metrics = %metrics,
            output = %output,
            "span log"
        );
    }

    fn end(&mut self) {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        tracing::info!(parent: &self.span, duration_ms, "span end");
        self.span = tracing::Span::none();
    }
}
