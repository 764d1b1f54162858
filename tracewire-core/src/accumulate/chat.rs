use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AccumulatedOutput;
use crate::{normalize_usage, Metrics};

/// Function part of a streamed tool call; `arguments` grows chunk by chunk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub function: FunctionRecord,
}

/// A chat completion rebuilt from its streamed fragments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccumulatedCompletion {
    pub role: Option<String>,
    pub content: Option<String>,
    /// Only the first concurrent tool call is tracked.
    pub tool_call: Option<ToolCallRecord>,
    pub finish_reason: Option<String>,
    pub metrics: Metrics,
}

impl AccumulatedCompletion {
    /// Renders the completion in the shape of a non-streamed `choices` array.
    pub fn to_output(&self) -> Value {
        json!([{
            "index": 0,
            "message": {
                "role": self.role,
                "content": self.content,
                "tool_calls": self.tool_call.as_ref().map(|call| vec![call]),
            },
            "logprobs": null,
            "finish_reason": self.finish_reason,
        }])
    }
}

/// Folds `chat.completion.chunk` fragments into one completion.
#[derive(Debug, Default)]
pub struct ChatCompletionAccumulator {
    completion: AccumulatedCompletion,
}

impl ChatCompletionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &Value) {
        if let Some(usage) = fragment.get("usage").filter(|usage| !usage.is_null()) {
            self.completion.metrics = normalize_usage(usage);
        }

        let Some(choice) = fragment
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
        else {
            return;
        };
        let Some(delta) = choice
            .get("delta")
            .and_then(Value::as_object)
            .filter(|delta| !delta.is_empty())
        else {
            return;
        };

        if self.completion.role.is_none() {
            if let Some(role) = delta.get("role").and_then(Value::as_str) {
                self.completion.role = Some(role.to_string());
            }
        }
        if let Some(reason) = delta.get("finish_reason").and_then(Value::as_str) {
            self.completion.finish_reason = Some(reason.to_string());
        }
        if let Some(content) = delta.get("content").and_then(Value::as_str) {
            self.completion
                .content
                .get_or_insert_with(String::new)
                .push_str(content);
        }
        if let Some(call) = delta
            .get("tool_calls")
            .and_then(Value::as_array)
            .and_then(|calls| calls.first())
        {
            self.push_tool_call(call);
        }
    }

    fn push_tool_call(&mut self, call: &Value) {
        let function = call.get("function");
        let arguments = function
            .and_then(|function| function.get("arguments"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        match self.completion.tool_call.as_mut() {
            Some(record) => record.function.arguments.push_str(arguments),
            None => {
                self.completion.tool_call = Some(ToolCallRecord {
                    id: string_field(call, "id"),
                    kind: string_field(call, "type"),
                    function: FunctionRecord {
                        name: function.and_then(|function| string_field(function, "name")),
                        arguments: arguments.to_string(),
                    },
                });
            }
        }
    }

    pub fn completion(&self) -> &AccumulatedCompletion {
        &self.completion
    }

    pub fn into_completion(self) -> AccumulatedCompletion {
        self.completion
    }

    pub fn finish(self) -> AccumulatedOutput {
        let output = self.completion.to_output();
        AccumulatedOutput {
            output,
            metrics: self.completion.metrics,
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
