//! Span factory and the scoped guard that owns an active span.

use crate::context::SpanContext;
use crate::scope::TraceScope;
use crate::sink::SpanSink;
use crate::span::{AttrValue, Span, SpanStatus};
use std::collections::HashMap;
use std::sync::Arc;

/// Root sampling policy.
///
/// Always-on is the only shipped policy; the decision is still made through
/// this enum so a ratio or parent-based sampler slots in without touching
/// the tracer.
#[derive(Debug, Clone, Copy, Default)]
pub enum Sampler {
    #[default]
    AlwaysOn,
}

impl Sampler {
    pub fn decide(&self) -> bool {
        match self {
            Sampler::AlwaysOn => true,
        }
    }
}

/// Starts spans and links them to the calling unit's [`TraceScope`].
pub struct Tracer {
    sampler: Sampler,
    sink: Arc<dyn SpanSink>,
}

impl Tracer {
    pub fn new(sink: Arc<dyn SpanSink>) -> Self {
        Self {
            sampler: Sampler::default(),
            sink,
        }
    }

    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// Start a span under the scope's current context, or as a fresh root
    /// when nothing is active. The new span becomes the scope's current
    /// span until the returned guard ends.
    pub fn start_span(&self, scope: &TraceScope, name: impl Into<String>) -> SpanGuard {
        let context = match scope.current() {
            Some(parent) => parent.child(),
            None => SpanContext::new_root(self.sampler.decide()),
        };
        scope.push(context);

        SpanGuard {
            context,
            span: Some(Span::start(context, name)),
            scope: scope.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

/// Scoped handle to an active span.
///
/// The guard is the span's single logical owner: it takes the recording
/// calls, and ending it (explicitly via [`SpanGuard::end`] or implicitly on
/// drop) freezes the span, pops exactly this span's scope entry, and hands
/// the frozen span to the sink. Early returns and unwinds therefore cannot
/// leak an active span.
pub struct SpanGuard {
    context: SpanContext,
    span: Option<Span>,
    scope: TraceScope,
    sink: Arc<dyn SpanSink>,
}

impl SpanGuard {
    /// Identity of the span this guard owns.
    pub fn context(&self) -> SpanContext {
        self.context
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        if let Some(span) = self.span.as_mut() {
            span.set_attribute(key, value);
        }
    }

    pub fn add_event(&mut self, name: impl Into<String>) {
        if let Some(span) = self.span.as_mut() {
            span.add_event(name);
        }
    }

    pub fn add_event_with_attributes(
        &mut self,
        name: impl Into<String>,
        attributes: HashMap<String, AttrValue>,
    ) {
        if let Some(span) = self.span.as_mut() {
            span.add_event_with_attributes(name, attributes);
        }
    }

    pub fn set_status(&mut self, status: SpanStatus) {
        if let Some(span) = self.span.as_mut() {
            span.set_status(status);
        }
    }

    /// End the span now instead of at scope exit.
    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if let Some(mut span) = self.span.take() {
            span.end();
            self.scope.remove(span.context.span_id);
            self.sink.submit(span);
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.finish();
    }
}
