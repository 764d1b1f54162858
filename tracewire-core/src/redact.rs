use regex::Regex;
use serde_json::Value;

const REDACTED: &str = "[REDACTED]";

/// Scrubs span inputs and metadata before they reach a sink.
///
/// String leaves matching the pattern are replaced with `[REDACTED]`, then cut
/// to at most `max_bytes` on a char boundary. Keys are left alone.
#[derive(Clone, Debug)]
pub struct Redactor {
    pattern: Option<Regex>,
    max_bytes: usize,
}

impl Redactor {
    pub fn new(pattern: Option<Regex>, max_bytes: usize) -> Self {
        Self { pattern, max_bytes }
    }

    pub fn apply(&self, value: Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.scrub(text)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| self.apply(item)).collect())
            }
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, self.apply(value)))
                    .collect(),
            ),
            other => other,
        }
    }

    fn scrub(&self, text: String) -> String {
        let text = match &self.pattern {
            Some(pattern) => pattern.replace_all(&text, REDACTED).into_owned(),
            None => text,
        };
        truncate(text, self.max_bytes)
    }
}

fn truncate(mut text: String, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    text
}
