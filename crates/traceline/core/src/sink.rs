//! Seam between the tracer and whatever consumes finished spans.

use crate::span::Span;
use parking_lot::Mutex;

/// Receives each span once, at the moment it ends.
///
/// Submission runs on the caller's execution unit and must stay cheap:
/// no I/O, no waiting. The batching pipeline implements this; tests use
/// [`CollectingSink`].
pub trait SpanSink: Send + Sync {
    fn submit(&self, span: Span);
}

/// Discards every span. Useful for wiring a tracer without a pipeline.
#[derive(Debug, Default)]
pub struct NoopSink;

impl SpanSink for NoopSink {
    fn submit(&self, _span: Span) {}
}

/// Keeps every submitted span in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    spans: Mutex<Vec<Span>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<Span> {
        self.spans.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.spans.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.lock().is_empty()
    }
}

impl SpanSink for CollectingSink {
    fn submit(&self, span: Span) {
        self.spans.lock().push(span);
    }
}
