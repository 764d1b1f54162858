//! Replays a recorded chat-completion stream through a traced endpoint and
//! reports the span with the `tracing` sink.
//!
//! ```text
//! RUST_LOG=info cargo run -p tracewire-openai --example replay_stream
//! ```
use std::convert::Infallible;
use std::sync::Arc;

use serde_json::{json, Value};
use tracewire_core::span::TracingSink;
use tracewire_openai::{
    CallParams, Endpoint, EndpointCapabilities, RawReply, Tracer, TracerConfig,
};
use tracing_subscriber::EnvFilter;

const RECORDED: &str = r#"
{"choices":[{"index":0,"delta":{"role":"assistant"}}]}
{"choices":[{"index":0,"delta":{"content":"Streams "}}]}
{"choices":[{"index":0,"delta":{"content":"are "}}]}
{"choices":[{"index":0,"delta":{"content":"replayed."}}]}
{"choices":[{"index":0,"delta":{"finish_reason":"stop"}}],"usage":{"prompt_tokens":9,"completion_tokens":4,"total_tokens":13}}
"#;

struct Recording(Vec<Value>);

impl EndpointCapabilities for Recording {}

impl Endpoint for Recording {
    type Response = Value;
    type Chunk = Value;
    type Error = Infallible;
    type Stream = std::vec::IntoIter<Result<Value, Infallible>>;

    fn create(&self, _params: CallParams) -> Result<RawReply<Value, Self::Stream>, Infallible> {
        let chunks: Vec<_> = self.0.iter().cloned().map(Ok).collect();
        Ok(RawReply::stream(chunks.into_iter()))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let chunks = RECORDED
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str)
        .collect::<Result<Vec<Value>, _>>()?;

    let tracer = Tracer::new(Arc::new(TracingSink::new()), TracerConfig::from_env()?);
    let completions = tracer.chat_completions(Recording(chunks));

    let params = CallParams::new()
        .with("model", "gpt-4o-mini")
        .with("stream", true)
        .with("messages", json!([{"role": "user", "content": "What happens here?"}]));
    let Some(stream) = completions.create(params)?.into_stream() else {
        return Err("expected a streamed reply".into());
    };

    let mut text = String::new();
    for chunk in stream {
        let chunk = chunk?;
        if let Some(content) = chunk["choices"][0]["delta"]["content"].as_str() {
            text.push_str(content);
        }
    }
    println!("{text}");
    Ok(())
}
