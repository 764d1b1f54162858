use serde::{Deserialize, Serialize};

use crate::TracewireError;

/// One unit of streamed output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamChunk {
    #[serde(rename = "text_delta")]
    Text { data: String },
    /// Raw JSON text; only meaningful once concatenated with its siblings.
    #[serde(rename = "json_delta")]
    Json { data: String },
}

impl StreamChunk {
    pub fn text(data: impl Into<String>) -> Self {
        StreamChunk::Text { data: data.into() }
    }

    pub fn json(data: impl Into<String>) -> Self {
        StreamChunk::Json { data: data.into() }
    }

    pub fn data(&self) -> &str {
        match self {
            StreamChunk::Text { data } | StreamChunk::Json { data } => data,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, StreamChunk::Json { .. })
    }
}

const TEXT_DELTA: &str = "text_delta";
const JSON_DELTA: &str = "json_delta";

/// Incremental decoder for server-sent-event text carrying stream chunks.
///
/// `text_delta` events hold a JSON-encoded string, `json_delta` events hold
/// raw JSON text. Any other event name is ignored.
///
/// A malformed event fails the call that reaches it, but the decoder stays
/// usable: chunks decoded before the failure are returned by the next
/// successful `feed` or `finish`, and decoding resumes after the bad event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    partial_line: String,
    event: Option<String>,
    data: Vec<String>,
    ready: Vec<StreamChunk>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a piece of the body. Lines split across calls are reassembled.
    pub fn feed(&mut self, text: &str) -> Result<Vec<StreamChunk>, TracewireError> {
        self.partial_line.push_str(text);
        self.drain_lines()?;
        Ok(std::mem::take(&mut self.ready))
    }

    /// Flushes an event left open by a body that did not end with a blank line.
    pub fn finish(&mut self) -> Result<Vec<StreamChunk>, TracewireError> {
        self.drain_lines()?;
        if !self.partial_line.is_empty() {
            let line = std::mem::take(&mut self.partial_line);
            self.process_line(line.trim_end_matches('\r'))?;
        }
        self.dispatch()?;
        Ok(std::mem::take(&mut self.ready))
    }

    fn drain_lines(&mut self) -> Result<(), TracewireError> {
        while let Some(newline) = self.partial_line.find('\n') {
            let line: String = self.partial_line.drain(..=newline).collect();
            self.process_line(line.trim_end_matches('\n').trim_end_matches('\r'))?;
        }
        Ok(())
    }

    fn process_line(&mut self, line: &str) -> Result<(), TracewireError> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return Ok(());
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        Ok(())
    }

    /// Closes the pending event. Its state is cleared before decoding, so a
    /// bad payload is dropped and never retried.
    fn dispatch(&mut self) -> Result<(), TracewireError> {
        let event = self.event.take();
        if self.data.is_empty() {
            return Ok(());
        }
        let data = std::mem::take(&mut self.data).join("\n");

        let chunk = match event.as_deref() {
            Some(TEXT_DELTA) => {
                let text: String = serde_json::from_str(&data).map_err(|err| {
                    TracewireError::Sse(format!("text_delta payload is not a JSON string: {err}"))
                })?;
                StreamChunk::Text { data: text }
            }
            Some(JSON_DELTA) => StreamChunk::Json { data },
            _ => return Ok(()),
        };
        self.ready.push(chunk);
        Ok(())
    }
}

/// Decodes a complete SSE body.
pub fn decode_sse(body: &str) -> Result<Vec<StreamChunk>, TracewireError> {
    let mut decoder = SseDecoder::new();
    let mut chunks = decoder.feed(body)?;
    chunks.extend(decoder.finish()?);
    Ok(chunks)
}
