use regex::Regex;
use serde_json::{json, Map, Value};
use tracewire_core::span::{MemorySink, TracingSink};
use tracewire_core::{
    merge_objects, to_log_value, Metrics, NoopSink, Redactor, SpanArgs, SpanGuard, SpanLog,
    SpanSink,
};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn args(name: &str) -> SpanArgs {
    SpanArgs::from_object(object(json!({
        "name": name,
        "span_attributes": {"type": "llm"},
        "input": [{"role": "user", "content": "hi"}],
        "metadata": {"model": "gpt-4o"},
    })))
}

#[test]
fn guard_ends_span_once_on_explicit_end_and_drop() {
    let sink = MemorySink::new();
    let mut guard = SpanGuard::new(sink.start_span(args("Chat Completion")));
    guard.log(SpanLog::output(json!("hello")));
    guard.end();
    assert!(guard.is_ended());
    guard.log(SpanLog::output(json!("ignored")));
    guard.end();
    drop(guard);

    let spans = sink.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].end_count, 1);
    assert_eq!(spans[0].logs.len(), 1);
    assert_eq!(spans[0].output(), Some(&json!("hello")));
    assert!(spans[0].end_time.is_some());
}

#[test]
fn dropping_a_guard_ends_the_span() {
    let sink = MemorySink::new();
    {
        let _guard = SpanGuard::new(sink.start_span(args("Response")));
    }
    assert!(sink.spans()[0].is_ended());
    assert_eq!(sink.spans()[0].end_count, 1);
}

#[test]
fn recorded_metrics_merge_across_logs() {
    let sink = MemorySink::new();
    let mut guard = SpanGuard::new(sink.start_span(args("Chat Completion")));
    let mut usage = Metrics::new();
    usage.insert_u64("prompt_tokens", 3);
    usage.insert_u64("tokens", 3);
    guard.log(SpanLog::metrics(usage));
    let mut later = Metrics::new();
    later.insert_u64("tokens", 10);
    later.insert_f64("time_to_first_token", 0.5);
    guard.log(SpanLog::new(later, json!([])));
    drop(guard);

    let spans = sink.spans();
    let span = &spans[0];
    assert_eq!(
        span.metrics().to_value(),
        json!({"prompt_tokens": 3, "tokens": 10, "time_to_first_token": 0.5})
    );
    assert_eq!(span.args.name, "Chat Completion");
    assert_eq!(span.args.span_type(), Some("llm"));
}

#[test]
fn concurrent_spans_are_recorded_independently() {
    let sink = MemorySink::new();
    let mut first = SpanGuard::new(sink.start_span(args("first")));
    let mut second = SpanGuard::new(sink.start_span(args("second")));
    second.log(SpanLog::output(json!(2)));
    second.end();
    first.log(SpanLog::output(json!(1)));
    drop(first);

    let spans = sink.spans();
    assert_eq!(spans[0].output(), Some(&json!(1)));
    assert_eq!(spans[1].output(), Some(&json!(2)));
    assert!(spans.iter().all(|span| span.end_count == 1));
    assert_ne!(spans[0].id, spans[1].id);
}

#[test]
fn span_args_split_known_fields_from_extras() {
    let args = SpanArgs::from_object(object(json!({
        "name": "Embedding",
        "span_attributes": {"type": "llm"},
        "input": "some text",
        "metadata": {"model": "text-embedding-3-small"},
        "parent": "span-1",
    })));
    assert_eq!(args.name, "Embedding");
    assert_eq!(args.input, json!("some text"));
    assert_eq!(args.metadata.get("model"), Some(&json!("text-embedding-3-small")));
    assert_eq!(args.extra.get("parent"), Some(&json!("span-1")));

    let serialized = to_log_value(&args).unwrap();
    assert_eq!(serialized["parent"], json!("span-1"));
    assert_eq!(serialized["span_attributes"], json!({"type": "llm"}));
}

#[test]
fn span_args_tolerate_missing_and_malformed_fields() {
    let args = SpanArgs::from_object(object(json!({"metadata": "nope"})));
    assert_eq!(args.name, "");
    assert_eq!(args.input, Value::Null);
    assert!(args.metadata.is_empty());
    assert_eq!(args.span_type(), None);
}

#[test]
fn merge_objects_merges_nested_maps() {
    let mut base = object(json!({
        "name": "Chat Completion",
        "span_attributes": {"type": "llm", "tier": 1},
        "metadata": {"model": "gpt-4o"},
    }));
    merge_objects(
        &mut base,
        object(json!({
            "name": "custom",
            "span_attributes": {"tier": 2},
            "metadata": "replaced",
        })),
    );
    assert_eq!(
        Value::Object(base),
        json!({
            "name": "custom",
            "span_attributes": {"type": "llm", "tier": 2},
            "metadata": "replaced",
        })
    );
}

#[test]
fn redactor_replaces_matches_before_truncating() {
    let redactor = Redactor::new(Some(Regex::new(r"sk-[A-Za-z0-9]+").unwrap()), 16);
    let value = redactor.apply(json!({
        "sk-key": "use sk-abc123 please",
        "nested": [{"note": "short"}, 7, null],
    }));
    assert_eq!(
        value,
        json!({
            "sk-key": "use [REDACTED] p",
            "nested": [{"note": "short"}, 7, null],
        })
    );
}

#[test]
fn redactor_truncates_on_char_boundaries() {
    let redactor = Redactor::new(None, 5);
    assert_eq!(redactor.apply(json!("héllo")), json!("héll"));
    assert_eq!(redactor.apply(json!("ab")), json!("ab"));
}

#[test]
fn noop_and_tracing_sinks_accept_full_lifecycles() {
    let sinks: Vec<Box<dyn SpanSink>> = vec![Box::new(NoopSink), Box::new(TracingSink::new())];
    for sink in sinks {
        let mut guard = SpanGuard::new(sink.start_span(args("Moderation")));
        let mut metrics = Metrics::new();
        metrics.insert_u64("prompt_tokens", 1);
        guard.log(SpanLog::new(metrics, json!({"results": []})));
        guard.end();
        assert!(guard.is_ended());
    }
}
