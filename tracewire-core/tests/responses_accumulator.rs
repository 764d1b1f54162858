use serde_json::json;
use tracewire_core::accumulate::{ContentEntry, OutputItem, ResponsesAccumulator};
use tracewire_core::{CallKind, DeltaAccumulator};

fn added(id: &str, kind: &str) -> serde_json::Value {
    json!({
        "type": "response.output_item.added",
        "output_index": 0,
        "item": {"id": id, "type": kind, "status": "in_progress"},
    })
}

fn text_delta(output_index: u64, content_index: u64, delta: &str) -> serde_json::Value {
    json!({
        "type": "response.output_text.delta",
        "output_index": output_index,
        "content_index": content_index,
        "delta": delta,
    })
}

#[test]
fn deltas_append_to_the_addressed_content_entry() {
    let mut accumulator = ResponsesAccumulator::new();
    accumulator.push(&added("msg_1", "message"));
    accumulator.push(&json!({
        "type": "response.content_part.added",
        "output_index": 0,
        "content_index": 0,
        "part": {"type": "output_text", "text": ""},
    }));
    accumulator.push(&text_delta(0, 0, "Hello"));
    accumulator.push(&text_delta(0, 0, ", world"));

    let response = accumulator.into_response();
    assert_eq!(response.output.len(), 1);
    let content = response.output[0].content.as_ref().unwrap();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0].text.as_deref(), Some("Hello, world"));
}

#[test]
fn item_lifecycle_and_usage_are_recorded() {
    let mut accumulator = ResponsesAccumulator::new();
    accumulator.push(&added("msg_1", "message"));
    accumulator.push(&text_delta(0, 0, "Hi"));
    accumulator.push(&json!({
        "type": "response.output_item.done",
        "output_index": 0,
        "item": {"id": "msg_1", "type": "message", "status": "completed"},
    }));
    accumulator.push(&json!({
        "type": "response.completed",
        "response": {"usage": {"input_tokens": 8, "output_tokens": 2, "total_tokens": 10}},
    }));

    let finished = accumulator.finish();
    assert_eq!(
        finished.output,
        json!([{
            "id": "msg_1",
            "type": "message",
            "status": "completed",
            "content": [{"text": "Hi"}],
        }])
    );
    assert_eq!(
        finished.metrics.to_value(),
        json!({"tokens": 10, "prompt_tokens": 8, "completion_tokens": 2})
    );
}

#[test]
fn multiple_items_and_content_entries_are_indexed_by_position() {
    let mut accumulator = ResponsesAccumulator::new();
    accumulator.push(&added("rs_1", "reasoning"));
    accumulator.push(&added("msg_1", "message"));
    accumulator.push(&text_delta(1, 0, "first"));
    accumulator.push(&text_delta(1, 1, "second"));
    accumulator.push(&text_delta(1, 0, "!"));
    accumulator.push(&json!({
        "type": "response.output_item.delta",
        "output_index": 0,
        "delta": {"summary": "thinking"},
    }));

    let response = accumulator.into_response();
    assert_eq!(response.output[0].delta, Some(json!({"summary": "thinking"})));
    assert_eq!(response.output[0].content, None);
    assert_eq!(
        response.output[1].content,
        Some(vec![
            ContentEntry {
                text: Some("first!".to_string()),
                annotations: None,
            },
            ContentEntry {
                text: Some("second".to_string()),
                annotations: None,
            },
        ])
    );
}

#[test]
fn annotations_append_or_overwrite_by_index() {
    let mut accumulator = ResponsesAccumulator::new();
    accumulator.push(&added("msg_1", "message"));
    accumulator.push(&text_delta(0, 0, "See docs"));
    for (index, url) in [(0, "https://a"), (1, "https://b"), (0, "https://c")] {
        accumulator.push(&json!({
            "type": "response.output_text.annotation.added",
            "output_index": 0,
            "content_index": 0,
            "annotation_index": index,
            "annotation": {"type": "url_citation", "url": url},
        }));
    }

    let response = accumulator.into_response();
    let entry = &response.output[0].content.as_ref().unwrap()[0];
    assert_eq!(entry.text.as_deref(), Some("See docs"));
    assert_eq!(
        entry.annotations,
        Some(vec![
            json!({"type": "url_citation", "url": "https://c"}),
            json!({"type": "url_citation", "url": "https://b"}),
        ])
    );
}

#[test]
fn out_of_range_indices_are_skipped() {
    let mut accumulator = ResponsesAccumulator::new();
    accumulator.push(&text_delta(0, 0, "no item yet"));
    accumulator.push(&json!({
        "type": "response.output_item.done",
        "output_index": 3,
        "item": {"status": "completed"},
    }));
    accumulator.push(&added("msg_1", "message"));
    accumulator.push(&text_delta(0, 2, "gap"));
    accumulator.push(&json!({
        "type": "response.output_text.annotation.added",
        "output_index": 0,
        "content_index": 0,
        "annotation_index": 5,
        "annotation": {},
    }));

    let response = accumulator.into_response();
    assert_eq!(response.output.len(), 1);
    assert_eq!(
        response.output[0],
        OutputItem {
            id: Some("msg_1".to_string()),
            kind: Some("message".to_string()),
            content: Some(vec![ContentEntry {
                text: None,
                annotations: Some(vec![]),
            }]),
            ..OutputItem::default()
        }
    );
}

#[test]
fn events_without_output_index_are_ignored() {
    let mut accumulator = DeltaAccumulator::for_kind(CallKind::Response);
    assert!(matches!(accumulator, DeltaAccumulator::Responses(_)));
    accumulator.push(&json!({"type": "response.created", "response": {"usage": null}}));
    accumulator.push(&json!({"type": "response.in_progress"}));
    let finished = accumulator.finish();
    assert_eq!(finished.output, json!([]));
    assert!(finished.metrics.is_empty());
}
