use std::fmt;

use serde::{Deserialize, Serialize};

/// The provider operation being traced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    ChatCompletion,
    Response,
    Embedding,
    Moderation,
}

impl CallKind {
    /// Default span name for calls of this kind.
    pub fn span_name(self) -> &'static str {
        match self {
            CallKind::ChatCompletion => "Chat Completion",
            CallKind::Response => "Response",
            CallKind::Embedding => "Embedding",
            CallKind::Moderation => "Moderation",
        }
    }

    /// Call parameter logged as the span input.
    pub fn input_key(self) -> &'static str {
        match self {
            CallKind::ChatCompletion => "messages",
            CallKind::Response | CallKind::Embedding | CallKind::Moderation => "input",
        }
    }

    /// Whether the immediate path records `time_to_first_token`.
    pub fn measures_first_token(self) -> bool {
        matches!(self, CallKind::ChatCompletion | CallKind::Response)
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.span_name())
    }
}
