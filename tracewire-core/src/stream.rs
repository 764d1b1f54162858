use std::fmt;

use serde_json::Value;

use crate::accumulate::ChunkAccumulator;
use crate::chunk::decode_sse;
use crate::tee::tee;
use crate::{StreamChunk, StreamError, TracewireError};

type ChunkSource = Box<dyn Iterator<Item = StreamChunk> + Send>;

/// The single value a finished stream reduces to.
#[derive(Clone, Debug, PartialEq)]
pub enum FinalValue {
    /// Concatenated JSON deltas, parsed as one document.
    Json(Value),
    /// Concatenated text deltas.
    Text(String),
    /// The stream carried no chunks.
    Empty,
}

impl FinalValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FinalValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FinalValue::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FinalValue::Empty)
    }

    pub fn into_value(self) -> Value {
        match self {
            FinalValue::Json(value) => value,
            FinalValue::Text(text) => Value::String(text),
            FinalValue::Empty => Value::Null,
        }
    }
}

/// A lazily produced, single-pass sequence of [`StreamChunk`]s.
///
/// Use [`LogicalStream::fork`] when the chunks are needed more than once; both
/// forks pull from the same producer through a shared buffer.
pub struct LogicalStream {
    source: ChunkSource,
    final_value: Option<Result<FinalValue, StreamError>>,
}

impl LogicalStream {
    pub fn new<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = StreamChunk>,
        I::IntoIter: Send + 'static,
    {
        Self {
            source: Box::new(chunks.into_iter()),
            final_value: None,
        }
    }

    pub fn from_chunks(chunks: Vec<StreamChunk>) -> Self {
        Self::new(chunks)
    }

    /// Builds a stream from a complete server-sent-event body.
    pub fn from_sse(body: &str) -> Result<Self, TracewireError> {
        Ok(Self::new(decode_sse(body)?))
    }

    /// Splits the remaining chunks into two independently consumable streams.
    ///
    /// `self` keeps an empty source afterwards. A final value that was already
    /// computed is shared with both forks.
    pub fn fork(&mut self) -> (LogicalStream, LogicalStream) {
        let (left, right) = tee(self.take_source());
        (
            Self {
                source: Box::new(left),
                final_value: self.final_value.clone(),
            },
            Self {
                source: Box::new(right),
                final_value: self.final_value.clone(),
            },
        )
    }

    /// Reduces the stream to its final value, computing it at most once.
    ///
    /// The reduction drains a snapshot of the stream, so iterating `self`
    /// afterwards still yields every chunk that had not been consumed yet.
    pub fn final_value(&mut self) -> Result<&FinalValue, StreamError> {
        let memo = match self.final_value.take() {
            Some(memo) => memo,
            None => {
                let (keep, snapshot) = tee(self.take_source());
                self.source = Box::new(keep);
                let mut accumulator = ChunkAccumulator::new();
                snapshot.for_each(|chunk| accumulator.push(chunk));
                accumulator.finish()
            }
        };
        let memo = self.final_value.insert(memo);
        memo.as_ref().map_err(Clone::clone)
    }

    fn take_source(&mut self) -> ChunkSource {
        std::mem::replace(&mut self.source, Box::new(std::iter::empty()))
    }
}

impl Iterator for LogicalStream {
    type Item = StreamChunk;

    fn next(&mut self) -> Option<StreamChunk> {
        self.source.next()
    }
}

impl fmt::Debug for LogicalStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicalStream")
            .field("final_value", &self.final_value)
            .finish_non_exhaustive()
    }
}
