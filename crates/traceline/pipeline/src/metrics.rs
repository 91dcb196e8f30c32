//! Pipeline health counters.
//!
//! Every failure mode the pipeline absorbs (overflow, exhausted retries,
//! post-stop submissions) surfaces here instead of as an error to the
//! request path.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct PipelineStats {
    pub(crate) spans_submitted: AtomicU64,
    pub(crate) spans_unsampled: AtomicU64,
    pub(crate) spans_dropped: AtomicU64,
    pub(crate) spans_rejected: AtomicU64,
    pub(crate) spans_exported: AtomicU64,
    pub(crate) spans_failed: AtomicU64,
    pub(crate) batches_exported: AtomicU64,
    pub(crate) batches_failed: AtomicU64,
    pub(crate) export_retries: AtomicU64,
}

impl PipelineStats {
    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            spans_submitted: self.spans_submitted.load(Ordering::Relaxed),
            spans_unsampled: self.spans_unsampled.load(Ordering::Relaxed),
            spans_dropped: self.spans_dropped.load(Ordering::Relaxed),
            spans_rejected: self.spans_rejected.load(Ordering::Relaxed),
            spans_exported: self.spans_exported.load(Ordering::Relaxed),
            spans_failed: self.spans_failed.load(Ordering::Relaxed),
            batches_exported: self.batches_exported.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            export_retries: self.export_retries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the pipeline counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Sampled spans accepted into the buffer.
    pub spans_submitted: u64,
    /// Spans discarded at the door because their trace is unsampled.
    pub spans_unsampled: u64,
    /// Oldest spans evicted on buffer overflow.
    pub spans_dropped: u64,
    /// Spans submitted after the pipeline stopped.
    pub spans_rejected: u64,
    /// Spans delivered to the collector.
    pub spans_exported: u64,
    /// Spans lost to exhausted retries or permanent export failures.
    pub spans_failed: u64,
    pub batches_exported: u64,
    pub batches_failed: u64,
    /// Individual retry attempts across all batches.
    pub export_retries: u64,
}
