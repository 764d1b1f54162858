use serde_json::{json, Value};
use tracewire_core::accumulate::{ChatCompletionAccumulator, FunctionRecord, ToolCallRecord};
use tracewire_core::{CallKind, DeltaAccumulator};

fn delta(delta: Value) -> Value {
    json!({"choices": [{"index": 0, "delta": delta, "finish_reason": null}]})
}

#[test]
fn text_fragments_rebuild_the_message() {
    let mut accumulator = ChatCompletionAccumulator::new();
    accumulator.push(&delta(json!({"role": "assistant"})));
    accumulator.push(&delta(json!({"content": "Hel"})));
    accumulator.push(&delta(json!({"content": "lo"})));
    accumulator.push(&json!({
        "choices": [{"index": 0, "delta": {"finish_reason": "stop"}}],
        "usage": {"total_tokens": 5},
    }));

    let completion = accumulator.completion();
    assert_eq!(completion.role.as_deref(), Some("assistant"));
    assert_eq!(completion.content.as_deref(), Some("Hello"));
    assert_eq!(completion.tool_call, None);
    assert_eq!(completion.finish_reason.as_deref(), Some("stop"));

    let finished = accumulator.finish();
    assert_eq!(finished.metrics.to_value(), json!({"tokens": 5}));
    assert_eq!(
        finished.output,
        json!([{
            "index": 0,
            "message": {"role": "assistant", "content": "Hello", "tool_calls": null},
            "logprobs": null,
            "finish_reason": "stop",
        }])
    );
}

#[test]
fn role_is_set_once_and_finish_reason_last_wins() {
    let mut accumulator = ChatCompletionAccumulator::new();
    accumulator.push(&delta(json!({"role": "assistant", "content": "a"})));
    accumulator.push(&delta(json!({"role": "user", "content": "b"})));
    accumulator.push(&delta(json!({"finish_reason": "length"})));
    accumulator.push(&delta(json!({"finish_reason": "stop"})));
    accumulator.push(&delta(json!({"finish_reason": null})));

    let completion = accumulator.into_completion();
    assert_eq!(completion.role.as_deref(), Some("assistant"));
    assert_eq!(completion.content.as_deref(), Some("ab"));
    assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
}

#[test]
fn empty_delta_with_choice_finish_reason_changes_nothing() {
    let mut accumulator = ChatCompletionAccumulator::new();
    accumulator.push(&json!({"choices": [{"delta": {}, "finish_reason": "stop"}]}));
    assert_eq!(accumulator.completion().finish_reason, None);

    accumulator.push(&delta(json!({"role": "assistant", "content": "hi"})));
    accumulator.push(&json!({"choices": [{"delta": {}, "finish_reason": "length"}]}));

    let completion = accumulator.into_completion();
    assert_eq!(completion.role.as_deref(), Some("assistant"));
    assert_eq!(completion.content.as_deref(), Some("hi"));
    assert_eq!(completion.finish_reason, None);
}

#[test]
fn tool_call_arguments_accumulate_on_first_record() {
    let mut accumulator = ChatCompletionAccumulator::new();
    accumulator.push(&delta(json!({
        "role": "assistant",
        "tool_calls": [{
            "index": 0,
            "id": "call_1",
            "type": "function",
            "function": {"name": "lookup", "arguments": ""},
        }],
    })));
    accumulator.push(&delta(json!({
        "tool_calls": [{"index": 0, "function": {"arguments": "{\"city\":"}}],
    })));
    accumulator.push(&delta(json!({
        "tool_calls": [{"index": 0, "function": {"arguments": "\"Oslo\"}"}}],
    })));

    let completion = accumulator.into_completion();
    assert_eq!(completion.content, None);
    assert_eq!(
        completion.tool_call,
        Some(ToolCallRecord {
            id: Some("call_1".to_string()),
            kind: Some("function".to_string()),
            function: FunctionRecord {
                name: Some("lookup".to_string()),
                arguments: "{\"city\":\"Oslo\"}".to_string(),
            },
        })
    );
}

#[test]
fn usage_overwrites_instead_of_merging() {
    let mut accumulator = ChatCompletionAccumulator::new();
    accumulator.push(&json!({"choices": [], "usage": {"prompt_tokens": 4, "total_tokens": 4}}));
    accumulator.push(&json!({"choices": [], "usage": null}));
    accumulator.push(&delta(json!({"content": "x"})));
    assert_eq!(accumulator.completion().metrics.get_u64("prompt_tokens"), Some(4));

    accumulator.push(&json!({"choices": [], "usage": {"completion_tokens": 1}}));
    assert_eq!(
        accumulator.completion().metrics.to_value(),
        json!({"completion_tokens": 1})
    );
}

#[test]
fn malformed_fragments_are_skipped() {
    let mut accumulator = ChatCompletionAccumulator::new();
    for fragment in [
        json!({}),
        json!({"choices": []}),
        json!({"choices": "nope"}),
        json!({"choices": [{}]}),
        json!({"choices": [{"delta": null}]}),
        json!({"choices": [{"delta": {}}]}),
        json!({"choices": [{"delta": {"content": 7, "tool_calls": []}}]}),
        json!(null),
    ] {
        accumulator.push(&fragment);
    }
    let completion = accumulator.into_completion();
    assert_eq!(completion.role, None);
    assert_eq!(completion.content, None);
    assert_eq!(completion.tool_call, None);
    assert!(completion.metrics.is_empty());
}

#[test]
fn delta_accumulator_picks_chat_mode_for_completions() {
    let mut accumulator = DeltaAccumulator::for_kind(CallKind::ChatCompletion);
    assert!(matches!(accumulator, DeltaAccumulator::Chat(_)));
    accumulator.push(&delta(json!({"content": "hi"})));
    let finished = accumulator.finish();
    assert_eq!(finished.output[0]["message"]["content"], json!("hi"));
}
