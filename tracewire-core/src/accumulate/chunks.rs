use crate::stream::FinalValue;
use crate::{StreamChunk, StreamError};

/// Reduces text and JSON deltas to a [`FinalValue`].
///
/// JSON deltas take precedence over text deltas when both are present.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    text: Option<String>,
    json: Option<String>,
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: StreamChunk) {
        match chunk {
            StreamChunk::Text { data } => self.text.get_or_insert_with(String::new).push_str(&data),
            StreamChunk::Json { data } => self.json.get_or_insert_with(String::new).push_str(&data),
        }
    }

    pub fn finish(self) -> Result<FinalValue, StreamError> {
        if let Some(json) = self.json {
            return serde_json::from_str(&json)
                .map(FinalValue::Json)
                .map_err(|err| StreamError::InvalidJson(err.to_string()));
        }
        Ok(match self.text {
            Some(text) => FinalValue::Text(text),
            None => FinalValue::Empty,
        })
    }
}
