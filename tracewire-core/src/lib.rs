//! Stream reconstruction and usage normalization for traced LLM calls.
//!
//! ```rust
//! use tracewire_core::{LogicalStream, StreamChunk};
//!
//! let mut stream = LogicalStream::from_chunks(vec![
//!     StreamChunk::text("Hel"),
//!     StreamChunk::text("lo"),
//! ]);
//! let (mut live, mut logged) = stream.fork();
//!
//! assert_eq!(live.next(), Some(StreamChunk::text("Hel")));
//! assert_eq!(logged.final_value().unwrap().as_text(), Some("Hello"));
//! assert_eq!(live.next(), Some(StreamChunk::text("lo")));
//! ```
pub mod accumulate;
mod chunk;
mod error;
mod json;
mod kind;
mod metrics;
mod redact;
pub mod span;
mod stream;
mod tee;
mod usage;

pub use accumulate::{AccumulatedOutput, DeltaAccumulator};
pub use chunk::{decode_sse, SseDecoder, StreamChunk};
pub use error::{StreamError, TracewireError};
pub use json::{merge_objects, to_log_value};
pub use kind::CallKind;
pub use metrics::Metrics;
pub use redact::Redactor;
pub use span::{NoopSink, Span, SpanArgs, SpanGuard, SpanLog, SpanSink};
pub use stream::{FinalValue, LogicalStream};
pub use tee::{tee, TeeHalf};
pub use usage::{normalize_usage, response_usage_metrics};

pub type Value = serde_json::Value;
