//! Span tracing for OpenAI-style provider endpoints.
//!
//! Wrap an endpoint with a [`Tracer`] and call it through the returned
//! [`Traced`] handle. Responses and stream items reach the caller unchanged;
//! the span receives the call input, output, normalized token usage and
//! time to first token.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use serde_json::{json, Value};
//! use tracewire_core::span::MemorySink;
//! use tracewire_openai::{
//!     CallParams, Endpoint, EndpointCapabilities, RawReply, Tracer, TracerConfig,
//! };
//!
//! struct Canned;
//!
//! impl EndpointCapabilities for Canned {}
//!
//! impl Endpoint for Canned {
//!     type Response = Value;
//!     type Chunk = Value;
//!     type Error = std::convert::Infallible;
//!     type Stream = std::vec::IntoIter<Result<Value, Self::Error>>;
//!
//!     fn create(&self, _params: CallParams) -> Result<RawReply<Value, Self::Stream>, Self::Error> {
//!         Ok(RawReply::complete(json!({
//!             "choices": [{"index": 0, "message": {"role": "assistant", "content": "hi"}}],
//!             "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4},
//!         })))
//!     }
//! }
//!
//! let sink = MemorySink::new();
//! let tracer = Tracer::new(Arc::new(sink.clone()), TracerConfig::new());
//! let completions = tracer.chat_completions(Canned);
//!
//! let params = CallParams::new()
//!     .with("model", "gpt-4o-mini")
//!     .with("messages", json!([{"role": "user", "content": "hello"}]));
//! let reply = completions.create(params).unwrap();
//! assert!(!reply.is_stream());
//!
//! let spans = sink.spans();
//! let span = &spans[0];
//! assert_eq!(span.args.name, "Chat Completion");
//! assert_eq!(span.metrics().get_u64("tokens"), Some(4));
//! ```
mod config;
mod error;
mod headers;
mod interceptor;
mod params;
mod provider;
mod stream;

pub use config::{TracerConfig, DEFAULT_MAX_FIELD_BYTES};
pub use error::CallError;
pub use headers::{cache_hit, CACHED_HEADER, LEGACY_CACHED_HEADER};
pub use http::HeaderMap;
pub use interceptor::{Traced, TracedReply, Tracer};
pub use params::{CallParams, SPAN_INFO_KEY};
pub use provider::{AsyncEndpoint, Endpoint, EndpointCapabilities, RawReply, ReplyBody};
pub use stream::{TracedAsyncStream, TracedStream};
