//! Core span model and lifecycle.
//!
//! A [`Tracer`] starts spans against a per-execution-unit [`TraceScope`];
//! the returned [`SpanGuard`] records attributes, events, and status, and on
//! end (explicit or drop) freezes the span and hands it to a [`SpanSink`].
//! The sink is the seam to the export pipeline: submission is synchronous
//! and never performs I/O.

#![deny(unsafe_code)]

pub mod context;
pub mod scope;
pub mod sink;
pub mod span;
pub mod tracer;

pub use context::{SpanContext, SpanId, TraceId};
pub use scope::TraceScope;
pub use sink::{CollectingSink, NoopSink, SpanSink};
pub use span::{AttrValue, Span, SpanEvent, SpanStatus};
pub use tracer::{Sampler, SpanGuard, Tracer};
