//! Batched span export pipeline.
//!
//! Ended spans arrive through the [`traceline_core::SpanSink`] seam into the
//! [`BatchProcessor`]'s bounded buffer. A single background worker owns the
//! flush timer and all export I/O; request-handling tasks only ever touch
//! the buffer lock. Export failures are retried with backoff, then counted
//! and dropped — they never travel back toward request handlers.

#![deny(unsafe_code)]

pub mod config;
pub mod exporter;
pub mod http;
pub mod metrics;
pub mod processor;

pub use config::PipelineConfig;
pub use exporter::{ExportError, MemoryExporter, SpanExporter};
pub use http::HttpExporter;
pub use metrics::StatsSnapshot;
pub use processor::BatchProcessor;
