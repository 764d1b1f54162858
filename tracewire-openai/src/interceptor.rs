use std::sync::Arc;
use std::time::Instant;

use http::HeaderMap;
use serde::Serialize;
use serde_json::{json, Value};
use tracewire_core::{
    normalize_usage, response_usage_metrics, to_log_value, CallKind, Metrics, NoopSink, Redactor,
    SpanGuard, SpanLog, SpanSink, TracewireError,
};

use crate::headers::cache_hit;
use crate::params::span_args;
use crate::stream::{StreamObserver, TIME_TO_FIRST_TOKEN};
use crate::{
    AsyncEndpoint, CallError, CallParams, Endpoint, EndpointCapabilities, RawReply, ReplyBody,
    TracedAsyncStream, TracedStream, TracerConfig,
};

/// Opens one span per provider call and reports inputs, outputs, usage and
/// timing to a [`SpanSink`].
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use tracewire_core::span::TracingSink;
/// use tracewire_openai::{Tracer, TracerConfig};
///
/// # fn wrap<E: tracewire_openai::EndpointCapabilities>(completions: E) {
/// let tracer = Tracer::new(Arc::new(TracingSink::new()), TracerConfig::new());
/// let completions = tracer.chat_completions(completions);
/// # }
/// ```
#[derive(Clone)]
pub struct Tracer {
    sink: Arc<dyn SpanSink>,
    config: TracerConfig,
    redactor: Redactor,
}

impl Tracer {
    pub fn new(sink: Arc<dyn SpanSink>, config: TracerConfig) -> Self {
        let redactor = Redactor::new(config.redact_regex.clone(), config.max_field_bytes);
        Self {
            sink,
            config,
            redactor,
        }
    }

    /// A tracer that forwards every call untouched.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopSink), TracerConfig::new().with_enabled(false))
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    pub fn chat_completions<E: EndpointCapabilities>(&self, endpoint: E) -> Traced<E> {
        self.wrap(CallKind::ChatCompletion, endpoint)
    }

    pub fn responses<E: EndpointCapabilities>(&self, endpoint: E) -> Traced<E> {
        self.wrap(CallKind::Response, endpoint)
    }

    pub fn embeddings<E: EndpointCapabilities>(&self, endpoint: E) -> Traced<E> {
        self.wrap(CallKind::Embedding, endpoint)
    }

    pub fn moderations<E: EndpointCapabilities>(&self, endpoint: E) -> Traced<E> {
        self.wrap(CallKind::Moderation, endpoint)
    }

    pub fn wrap<E: EndpointCapabilities>(&self, kind: CallKind, endpoint: E) -> Traced<E> {
        let raw_response = endpoint.exposes_raw_response();
        Traced {
            endpoint,
            kind,
            tracer: self.clone(),
            raw_response,
        }
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// What a traced call hands back: the provider's response, or its stream
/// wrapped so that consuming it feeds the span.
#[derive(Debug)]
pub enum TracedReply<R, S> {
    Complete(R),
    Stream(S),
}

impl<R, S> TracedReply<R, S> {
    pub fn is_stream(&self) -> bool {
        matches!(self, TracedReply::Stream(_))
    }

    pub fn into_complete(self) -> Option<R> {
        match self {
            TracedReply::Complete(response) => Some(response),
            TracedReply::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<S> {
        match self {
            TracedReply::Complete(_) => None,
            TracedReply::Stream(stream) => Some(stream),
        }
    }
}

/// A provider endpoint wrapped by a [`Tracer`].
pub struct Traced<E> {
    endpoint: E,
    kind: CallKind,
    tracer: Tracer,
    raw_response: bool,
}

impl<E> Traced<E> {
    pub fn kind(&self) -> CallKind {
        self.kind
    }

    pub fn inner(&self) -> &E {
        &self.endpoint
    }

    pub fn into_inner(self) -> E {
        self.endpoint
    }

    /// Strips `span_info` and, when tracing is enabled, opens the span.
    fn begin(&self, params: &mut CallParams) -> Option<ActiveCall> {
        let span_info = params.take_span_info();
        if !self.tracer.config.enabled {
            return None;
        }
        let args = span_args(self.kind, span_info, params, &self.tracer.redactor);
        let span = SpanGuard::new(self.tracer.sink.start_span(args));
        Some(ActiveCall {
            kind: self.kind,
            span,
            started: Instant::now(),
            stream_requested: params.stream_requested(),
        })
    }

    fn settle<R, S, T, Err>(
        &self,
        call: Option<ActiveCall>,
        reply: RawReply<R, S>,
        wrap: impl FnOnce(S, Option<StreamObserver>) -> T,
    ) -> Result<TracedReply<R, T>, CallError<Err>>
    where
        R: Serialize,
    {
        let Some(mut call) = call else {
            return Ok(match reply.body {
                ReplyBody::Complete(response) => TracedReply::Complete(response),
                ReplyBody::Stream(stream) => TracedReply::Stream(wrap(stream, None)),
            });
        };

        call.check_shape(matches!(reply.body, ReplyBody::Stream(_)));
        if self.raw_response && self.tracer.config.capture_headers {
            if let Some(headers) = &reply.headers {
                call.log_cache_hit(headers);
            }
        }

        match reply.body {
            ReplyBody::Complete(response) => {
                call.log_response(&response)?;
                Ok(TracedReply::Complete(response))
            }
            ReplyBody::Stream(stream) => Ok(TracedReply::Stream(wrap(
                stream,
                Some(call.into_observer()),
            ))),
        }
    }
}

impl<E: Endpoint> Traced<E> {
    /// Calls the endpoint and traces it.
    ///
    /// The span of a non-streamed call is ended before this returns. A
    /// streamed reply keeps its span open until the returned stream is
    /// exhausted or dropped.
    pub fn create(
        &self,
        mut params: CallParams,
    ) -> Result<TracedReply<E::Response, TracedStream<E::Stream>>, CallError<E::Error>> {
        let call = self.begin(&mut params);
        // On failure the span ends without a log when `call` drops.
        let reply = self.endpoint.create(params).map_err(CallError::Provider)?;
        self.settle(call, reply, TracedStream::new)
    }
}

impl<E: AsyncEndpoint> Traced<E> {
    /// Async counterpart of [`Traced::create`].
    pub async fn acreate(
        &self,
        mut params: CallParams,
    ) -> Result<TracedReply<E::Response, TracedAsyncStream<E::Stream>>, CallError<E::Error>> {
        let call = self.begin(&mut params);
        let reply = self
            .endpoint
            .create(params)
            .await
            .map_err(CallError::Provider)?;
        self.settle(call, reply, TracedAsyncStream::new)
    }
}

impl<E: std::fmt::Debug> std::fmt::Debug for Traced<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traced")
            .field("endpoint", &self.endpoint)
            .field("kind", &self.kind)
            .field("raw_response", &self.raw_response)
            .finish_non_exhaustive()
    }
}

/// A call whose span is open.
struct ActiveCall {
    kind: CallKind,
    span: SpanGuard,
    started: Instant,
    stream_requested: Option<bool>,
}

impl ActiveCall {
    fn check_shape(&self, streamed: bool) {
        if let Some(requested) = self.stream_requested.filter(|requested| *requested != streamed) {
            tracing::debug!(
                kind = %self.kind,
                requested,
                streamed,
                "reply shape does not match the stream parameter"
            );
        }
    }

    fn log_cache_hit(&mut self, headers: &HeaderMap) {
        if let Some(cached) = cache_hit(headers) {
            let mut metrics = Metrics::new();
            metrics.insert_u64("cached", cached);
            self.span.log(SpanLog::metrics(metrics));
        }
    }

    fn log_response<R: Serialize>(&mut self, response: &R) -> Result<(), TracewireError> {
        let response = to_log_value(response)?;
        let usage = response.get("usage").unwrap_or(&Value::Null);

        let (mut metrics, output) = match self.kind {
            CallKind::ChatCompletion => (normalize_usage(usage), field(&response, "choices")),
            CallKind::Response => (response_usage_metrics(usage), field(&response, "output")),
            CallKind::Embedding => (
                normalize_usage(usage),
                json!({ "embedding_length": embedding_length(&response) }),
            ),
            CallKind::Moderation => (normalize_usage(usage), field(&response, "results")),
        };
        if self.kind.measures_first_token() {
            metrics.insert_f64(TIME_TO_FIRST_TOKEN, self.started.elapsed().as_secs_f64());
        }

        self.span.log(SpanLog::new(metrics, output));
        self.span.end();
        Ok(())
    }

    fn into_observer(self) -> StreamObserver {
        StreamObserver::new(self.kind, self.span, self.started)
    }
}

fn field(response: &Value, key: &str) -> Value {
    response.get(key).cloned().unwrap_or(Value::Null)
}

fn embedding_length(response: &Value) -> Option<usize> {
    response
        .get("data")
        .and_then(|data| data.get(0))
        .and_then(|first| first.get("embedding"))
        .and_then(Value::as_array)
        .map(Vec::len)
}
