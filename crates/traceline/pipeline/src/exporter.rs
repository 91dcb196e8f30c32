//! Exporter contract and the in-memory implementation used by tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use traceline_core::Span;

/// Why an export attempt failed.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Worth retrying: network trouble, collector overload, timeout.
    #[error("transient export failure: {0}")]
    Transient(String),

    /// Not worth retrying: the collector rejected the batch outright.
    #[error("permanent export failure: {0}")]
    Permanent(String),
}

/// Transmits finished spans to a collector.
///
/// Invoked only by the batch processor's worker, never from request
/// handlers. A retried batch may have been partially received by the far
/// end; the pipeline does not deduplicate on the wire and relies on the
/// collector's own idempotence.
#[async_trait]
pub trait SpanExporter: Send + Sync {
    async fn export(&self, batch: &[Span]) -> Result<(), ExportError>;
}

/// Records batches in memory, optionally failing the first N calls.
#[derive(Debug, Default)]
pub struct MemoryExporter {
    batches: Mutex<Vec<Vec<Span>>>,
    fail_remaining: AtomicUsize,
    fail_permanently: bool,
}

impl MemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` export calls transiently, then succeed.
    pub fn fail_first(n: usize) -> Self {
        Self {
            fail_remaining: AtomicUsize::new(n),
            ..Self::default()
        }
    }

    /// Fail the first `n` export calls permanently, then succeed.
    pub fn fail_first_permanent(n: usize) -> Self {
        Self {
            fail_remaining: AtomicUsize::new(n),
            fail_permanently: true,
            ..Self::default()
        }
    }

    /// Every batch received so far, in export order.
    pub fn batches(&self) -> Vec<Vec<Span>> {
        self.batches.lock().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().iter().map(|b| b.len()).collect()
    }

    /// Names of all exported spans, flattened in export order.
    pub fn span_names(&self) -> Vec<String> {
        self.batches
            .lock()
            .iter()
            .flatten()
            .map(|s| s.name.clone())
            .collect()
    }
}

#[async_trait]
impl SpanExporter for MemoryExporter {
    async fn export(&self, batch: &[Span]) -> Result<(), ExportError> {
        let failing = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            if self.fail_permanently {
                return Err(ExportError::Permanent("injected failure".to_string()));
            }
            return Err(ExportError::Transient("injected failure".to_string()));
        }

        self.batches.lock().push(batch.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traceline_core::SpanContext;

    fn ended_span(name: &str) -> Span {
        let mut span = Span::start(SpanContext::new_root(true), name);
        span.end();
        span
    }

    #[tokio::test]
    async fn memory_exporter_records_batches() {
        let exporter = MemoryExporter::new();
        exporter.export(&[ended_span("a"), ended_span("b")]).await.unwrap();
        exporter.export(&[ended_span("c")]).await.unwrap();

        assert_eq!(exporter.batch_sizes(), vec![2, 1]);
        assert_eq!(exporter.span_names(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn fail_first_recovers_after_n_calls() {
        let exporter = MemoryExporter::fail_first(2);
        let batch = [ended_span("x")];

        assert!(matches!(
            exporter.export(&batch).await,
            Err(ExportError::Transient(_))
        ));
        assert!(matches!(
            exporter.export(&batch).await,
            Err(ExportError::Transient(_))
        ));
        assert!(exporter.export(&batch).await.is_ok());
        assert_eq!(exporter.batch_sizes(), vec![1]);
    }
}
