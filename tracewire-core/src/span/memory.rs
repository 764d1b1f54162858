use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{Span, SpanArgs, SpanLog, SpanSink};
use crate::Metrics;

/// A span captured by [`MemorySink`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordedSpan {
    pub id: Uuid,
    pub args: SpanArgs,
    pub logs: Vec<SpanLog>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// How many times `end` was called. Anything but 1 on a finished call is a bug.
    pub end_count: usize,
}

impl RecordedSpan {
    /// All logged metrics merged in log order.
    pub fn metrics(&self) -> Metrics {
        let mut merged = Metrics::new();
        for entry in &self.logs {
            if let Some(metrics) = &entry.metrics {
                merged.merge(metrics.clone());
            }
        }
        merged
    }

    /// The most recently logged output.
    pub fn output(&self) -> Option<&Value> {
        self.logs.iter().rev().find_map(|entry| entry.output.as_ref())
    }

    pub fn is_ended(&self) -> bool {
        self.end_count > 0
    }
}

/// Sink that keeps every span in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    spans: Arc<Mutex<Vec<RecordedSpan>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<RecordedSpan> {
        lock(&self.spans).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.spans).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.spans).is_empty()
    }
}

impl std::fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySink")
            .field("spans", &self.len())
            .finish()
    }
}

impl SpanSink for MemorySink {
    fn start_span(&self, args: SpanArgs) -> Box<dyn Span> {
        let mut spans = lock(&self.spans);
        let index = spans.len();
        spans.push(RecordedSpan {
            id: Uuid::new_v4(),
            args,
            logs: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            end_count: 0,
        });
        Box::new(MemorySpan {
            spans: Arc::clone(&self.spans),
            index,
        })
    }
}

struct MemorySpan {
    spans: Arc<Mutex<Vec<RecordedSpan>>>,
    index: usize,
}

impl Span for MemorySpan {
    fn log(&mut self, entry: SpanLog) {
        if let Some(span) = lock(&self.spans).get_mut(self.index) {
            span.logs.push(entry);
        }
    }

    fn end(&mut self) {
        if let Some(span) = lock(&self.spans).get_mut(self.index) {
            span.end_count += 1;
            span.end_time.get_or_insert_with(Utc::now);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
