//! Reducers that rebuild one logical result from incremental fragments.

mod chat;
mod chunks;
mod responses;

pub use chat::{AccumulatedCompletion, ChatCompletionAccumulator, FunctionRecord, ToolCallRecord};
pub use chunks::ChunkAccumulator;
pub use responses::{AccumulatedResponse, ContentEntry, OutputItem, ResponsesAccumulator};

use serde::Serialize;
use serde_json::Value;

use crate::{CallKind, Metrics};

/// Finalized output and metrics, ready to be logged on a span.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AccumulatedOutput {
    pub output: Value,
    pub metrics: Metrics,
}

/// Fragment reducer whose mode is fixed when it is created.
#[derive(Debug)]
pub enum DeltaAccumulator {
    Chat(ChatCompletionAccumulator),
    Responses(ResponsesAccumulator),
}

impl DeltaAccumulator {
    /// Structured responses get the event reducer; every other kind streams
    /// chat-completion shaped fragments.
    pub fn for_kind(kind: CallKind) -> Self {
        match kind {
            CallKind::Response => DeltaAccumulator::Responses(ResponsesAccumulator::new()),
            CallKind::ChatCompletion | CallKind::Embedding | CallKind::Moderation => {
                DeltaAccumulator::Chat(ChatCompletionAccumulator::new())
            }
        }
    }

    pub fn push(&mut self, fragment: &Value) {
        match self {
            DeltaAccumulator::Chat(accumulator) => accumulator.push(fragment),
            DeltaAccumulator::Responses(accumulator) => accumulator.push(fragment),
        }
    }

    pub fn finish(self) -> AccumulatedOutput {
        match self {
            DeltaAccumulator::Chat(accumulator) => accumulator.finish(),
            DeltaAccumulator::Responses(accumulator) => accumulator.finish(),
        }
    }
}
