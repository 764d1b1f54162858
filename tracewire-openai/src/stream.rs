use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::{ready, Stream, StreamExt};
use serde::Serialize;
use tracewire_core::{
    to_log_value, AccumulatedOutput, CallKind, DeltaAccumulator, Metrics, SpanGuard, SpanLog,
};

pub(crate) const TIME_TO_FIRST_TOKEN: &str = "time_to_first_token";

/// Per-call streaming state shared by [`TracedStream`] and [`TracedAsyncStream`].
///
/// Dropping an observer that has not finished logs whatever was accumulated
/// so far and ends the span.
pub(crate) struct StreamObserver {
    started: Instant,
    first_seen: bool,
    accumulator: Option<DeltaAccumulator>,
    span: SpanGuard,
}

impl StreamObserver {
    pub(crate) fn new(kind: CallKind, span: SpanGuard, started: Instant) -> Self {
        Self {
            started,
            first_seen: false,
            accumulator: Some(DeltaAccumulator::for_kind(kind)),
            span,
        }
    }

    fn observe<C: Serialize, E>(&mut self, item: Option<&Result<C, E>>) {
        match item {
            Some(Ok(chunk)) => self.push(chunk),
            Some(Err(_)) => {}
            None => {
                self.finish();
            }
        }
    }

    fn push<C: Serialize>(&mut self, chunk: &C) {
        if !self.first_seen {
            self.first_seen = true;
            let mut metrics = Metrics::new();
            metrics.insert_f64(TIME_TO_FIRST_TOKEN, self.started.elapsed().as_secs_f64());
            self.span.log(SpanLog::metrics(metrics));
        }

        let Some(accumulator) = self.accumulator.as_mut() else {
            return;
        };
        match to_log_value(chunk) {
            Ok(fragment) => accumulator.push(&fragment),
            Err(err) => tracing::warn!(error = %err, "skipping stream fragment that cannot be logged"),
        }
    }

    /// Logs the accumulated result and ends the span. Only the first call
    /// returns the output.
    fn finish(&mut self) -> Option<AccumulatedOutput> {
        let accumulator = self.accumulator.take()?;
        let finished = accumulator.finish();
        self.span.log(SpanLog::new(
            finished.metrics.clone(),
            finished.output.clone(),
        ));
        self.span.end();
        Some(finished)
    }
}

impl Drop for StreamObserver {
    fn drop(&mut self) {
        if self.accumulator.is_some() {
            tracing::debug!("traced stream dropped before it was exhausted");
            self.finish();
        }
    }
}

/// A blocking provider stream that logs to its span as it is consumed.
///
/// Items are yielded unchanged. The span ends when the stream is exhausted or
/// dropped, whichever comes first.
pub struct TracedStream<S> {
    inner: S,
    observer: Option<StreamObserver>,
}

impl<S> TracedStream<S> {
    pub(crate) fn new(inner: S, observer: Option<StreamObserver>) -> Self {
        Self { inner, observer }
    }

    pub fn is_traced(&self) -> bool {
        self.observer.is_some()
    }
}

impl<S, C, E> TracedStream<S>
where
    S: Iterator<Item = Result<C, E>>,
    C: Serialize,
{
    /// Consumes the rest of the stream without handing items to the caller
    /// and returns what was logged. `None` when tracing is disabled.
    ///
    /// A provider error stops the drain; the partial result is still logged.
    pub fn drain(mut self) -> Result<Option<AccumulatedOutput>, E> {
        for item in self.inner.by_ref() {
            let chunk = item?;
            if let Some(observer) = self.observer.as_mut() {
                observer.push(&chunk);
            }
        }
        Ok(self.observer.as_mut().and_then(StreamObserver::finish))
    }
}

impl<S, C, E> Iterator for TracedStream<S>
where
    S: Iterator<Item = Result<C, E>>,
    C: Serialize,
{
    type Item = Result<C, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next();
        if let Some(observer) = self.observer.as_mut() {
            observer.observe(item.as_ref());
        }
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S> std::fmt::Debug for TracedStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracedStream")
            .field("traced", &self.is_traced())
            .finish_non_exhaustive()
    }
}

/// Async counterpart of [`TracedStream`].
pub struct TracedAsyncStream<S> {
    inner: S,
    observer: Option<StreamObserver>,
}

impl<S> TracedAsyncStream<S> {
    pub(crate) fn new(inner: S, observer: Option<StreamObserver>) -> Self {
        Self { inner, observer }
    }

    pub fn is_traced(&self) -> bool {
        self.observer.is_some()
    }
}

impl<S, C, E> TracedAsyncStream<S>
where
    S: Stream<Item = Result<C, E>> + Unpin,
    C: Serialize,
{
    /// See [`TracedStream::drain`].
    pub async fn drain(mut self) -> Result<Option<AccumulatedOutput>, E> {
        while let Some(item) = self.inner.next().await {
            let chunk = item?;
            if let Some(observer) = self.observer.as_mut() {
                observer.push(&chunk);
            }
        }
        Ok(self.observer.as_mut().and_then(StreamObserver::finish))
    }
}

impl<S, C, E> Stream for TracedAsyncStream<S>
where
    S: Stream<Item = Result<C, E>> + Unpin,
    C: Serialize,
{
    type Item = Result<C, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let item = ready!(this.inner.poll_next_unpin(cx));
        if let Some(observer) = this.observer.as_mut() {
            observer.observe(item.as_ref());
        }
        Poll::Ready(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S> std::fmt::Debug for TracedAsyncStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracedAsyncStream")
            .field("traced", &self.is_traced())
            .finish_non_exhaustive()
    }
}
