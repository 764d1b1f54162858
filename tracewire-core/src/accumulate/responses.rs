use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AccumulatedOutput;
use crate::{response_usage_metrics, Metrics};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Value>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputItem {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentEntry>>,
}

/// Output items of a structured response, rebuilt from its stream events.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccumulatedResponse {
    pub output: Vec<OutputItem>,
    pub metrics: Metrics,
}

/// Folds structured-response stream events (`response.output_item.added`,
/// `response.output_text.delta`, ...) into output items.
///
/// Items and content entries are addressed by position: an index equal to the
/// current length appends a slot, a smaller one addresses an existing slot.
/// Anything else is skipped.
#[derive(Debug, Default)]
pub struct ResponsesAccumulator {
    response: AccumulatedResponse,
}

impl ResponsesAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: &Value) {
        if let Some(usage) = event_usage(event) {
            self.response.metrics = response_usage_metrics(usage);
        }

        let event_type = event
            .get("type")
            .and_then(Value::as_str)
            .map(|kind| kind.strip_prefix("response.").unwrap_or(kind))
            .unwrap_or_default();

        if event_type == "output_item.added" {
            let item = event.get("item");
            self.response.output.push(OutputItem {
                id: item.and_then(|item| string_field(item, "id")),
                kind: item.and_then(|item| string_field(item, "type")),
                ..OutputItem::default()
            });
            return;
        }

        let Some(output_index) = event.get("output_index").and_then(Value::as_u64) else {
            return;
        };
        let output_len = self.response.output.len();
        let Some(item) = usize::try_from(output_index)
            .ok()
            .and_then(|index| self.response.output.get_mut(index))
        else {
            tracing::debug!(
                event_type,
                output_index,
                output_len,
                "skipping response event for unknown output item"
            );
            return;
        };

        match event_type {
            "output_item.done" => {
                item.status = event
                    .get("item")
                    .and_then(|item| string_field(item, "status"));
                return;
            }
            "output_item.delta" => {
                item.delta = event.get("delta").cloned();
                return;
            }
            _ => {}
        }

        let Some(content_index) = event.get("content_index").and_then(Value::as_u64) else {
            return;
        };
        let entries = item.content.get_or_insert_with(Vec::new);
        let content_len = entries.len();
        let Some(entry) = append_or_index(entries, content_index) else {
            tracing::debug!(
                event_type,
                content_index,
                content_len,
                "skipping response event with out-of-range content index"
            );
            return;
        };

        if let Some(delta) = event
            .get("delta")
            .and_then(Value::as_str)
            .filter(|delta| !delta.is_empty())
        {
            entry.text.get_or_insert_with(String::new).push_str(delta);
        }

        if event_type == "output_text.annotation.added" {
            let Some(annotation_index) = event.get("annotation_index").and_then(Value::as_u64)
            else {
                return;
            };
            let annotations = entry.annotations.get_or_insert_with(Vec::new);
            match append_or_index(annotations, annotation_index) {
                Some(slot) => *slot = event.get("annotation").cloned().unwrap_or(Value::Null),
                None => tracing::debug!(
                    annotation_index,
                    "skipping annotation with out-of-range index"
                ),
            }
        }
    }

    pub fn response(&self) -> &AccumulatedResponse {
        &self.response
    }

    pub fn into_response(self) -> AccumulatedResponse {
        self.response
    }

    pub fn finish(self) -> AccumulatedOutput {
        let output = serde_json::to_value(&self.response.output).unwrap_or(Value::Null);
        AccumulatedOutput {
            output,
            metrics: self.response.metrics,
        }
    }
}

fn event_usage(event: &Value) -> Option<&Value> {
    event
        .get("usage")
        .filter(|usage| !usage.is_null())
        .or_else(|| {
            event
                .get("response")
                .and_then(|response| response.get("usage"))
                .filter(|usage| !usage.is_null())
        })
}

fn append_or_index<T: Default>(slots: &mut Vec<T>, index: u64) -> Option<&mut T> {
    let index = usize::try_from(index).ok()?;
    if index == slots.len() {
        slots.push(T::default());
    }
    slots.get_mut(index)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
