//! Batch processor: bounded buffer, flush triggers, retry, shutdown drain.

use crate::config::PipelineConfig;
use crate::exporter::{ExportError, SpanExporter};
use crate::metrics::{PipelineStats, StatsSnapshot};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
use traceline_core::{Span, SpanSink};

const RUNNING: u8 = 0;
const DRAINING: u8 = 1;
const STOPPED: u8 = 2;

struct Shared {
    buffer: Mutex<VecDeque<Span>>,
    state: AtomicU8,
    batch_ready: Notify,
    stats: PipelineStats,
}

/// Collects ended spans and exports them in batches from one background
/// worker.
///
/// Submission is O(1) and lock-only; all export I/O happens on the worker.
/// Lifecycle is `Running -> Draining -> Stopped`: [`BatchProcessor::shutdown`]
/// flushes what remains exactly once, bounded by the configured shutdown
/// timeout, after which pending spans are discarded rather than holding up
/// process exit.
pub struct BatchProcessor {
    shared: Arc<Shared>,
    config: PipelineConfig,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BatchProcessor {
    /// Spawn the processor and its worker on the current tokio runtime.
    pub fn spawn(config: PipelineConfig, exporter: Arc<dyn SpanExporter>) -> Arc<Self> {
        let shared = Arc::new(Shared {
            buffer: Mutex::new(VecDeque::new()),
            state: AtomicU8::new(RUNNING),
            batch_ready: Notify::new(),
            stats: PipelineStats::default(),
        });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = Worker {
            shared: Arc::clone(&shared),
            exporter,
            config: config.clone(),
            shutdown_rx,
        };
        let handle = tokio::spawn(worker.run());

        Arc::new(Self {
            shared,
            config,
            shutdown_tx,
            worker: Mutex::new(Some(handle)),
        })
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.state.load(Ordering::SeqCst) == STOPPED
    }

    /// Drain and stop. The worker flushes whatever remains in the buffer
    /// exactly once; past `shutdown_timeout` it is aborted and pending
    /// spans are discarded. Further submissions become counted no-ops.
    pub async fn shutdown(&self) {
        if self.shared.state.load(Ordering::SeqCst) == STOPPED {
            return;
        }
        let _ = self
            .shared
            .state
            .compare_exchange(RUNNING, DRAINING, Ordering::SeqCst, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);

        let handle = self.worker.lock().take();
        if let Some(mut handle) = handle {
            if timeout(self.config.shutdown_timeout, &mut handle)
                .await
                .is_err()
            {
                tracing::warn!("shutdown drain exceeded timeout, discarding pending spans");
                handle.abort();
            }
        }
        self.shared.state.store(STOPPED, Ordering::SeqCst);
    }
}

impl SpanSink for BatchProcessor {
    fn submit(&self, span: Span) {
        let stats = &self.shared.stats;
        match self.shared.state.load(Ordering::SeqCst) {
            STOPPED => {
                stats.spans_rejected.fetch_add(1, Ordering::Relaxed);
            }
            DRAINING => {
                // Late handler completions still ride the final flush if
                // there is room; nothing past it is promised.
                if !span.context.sampled {
                    stats.spans_unsampled.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                let mut buffer = self.shared.buffer.lock();
                if buffer.len() >= self.config.queue_capacity {
                    stats.spans_dropped.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                buffer.push_back(span);
                stats.spans_submitted.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                if !span.context.sampled {
                    stats.spans_unsampled.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                let batch_ready = {
                    let mut buffer = self.shared.buffer.lock();
                    if buffer.len() >= self.config.queue_capacity {
                        // Drop-oldest: favor the request path's newest data
                        // over completeness of telemetry.
                        buffer.pop_front();
                        stats.spans_dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    buffer.push_back(span);
                    stats.spans_submitted.fetch_add(1, Ordering::Relaxed);
                    buffer.len() >= self.config.max_batch_size
                };
                if batch_ready {
                    self.shared.batch_ready.notify_one();
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum FlushMode {
    /// Take everything, batch-sized chunks, partial tail included.
    All,
    /// Take only full batches; leave a partial tail for the timer.
    CompleteBatches,
}

struct Worker {
    shared: Arc<Shared>,
    exporter: Arc<dyn SpanExporter>,
    config: PipelineConfig,
    shutdown_rx: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self) {
        let mut ticker = interval(self.config.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the loop
        // starts with a full interval ahead.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush(FlushMode::All).await;
                }
                _ = self.shared.batch_ready.notified() => {
                    self.flush(FlushMode::CompleteBatches).await;
                }
                _ = self.shutdown_rx.changed() => {
                    break;
                }
            }
        }

        // Final drain: the one flush the Draining state promises.
        self.flush(FlushMode::All).await;
    }

    async fn flush(&self, mode: FlushMode) {
        while let Some(batch) = self.next_batch(mode) {
            self.export_with_retry(batch).await;
        }
    }

    fn next_batch(&self, mode: FlushMode) -> Option<Vec<Span>> {
        let max = self.config.max_batch_size.max(1);
        let mut buffer = self.shared.buffer.lock();
        if buffer.is_empty() {
            return None;
        }
        if matches!(mode, FlushMode::CompleteBatches) && buffer.len() < max {
            return None;
        }
        let take = buffer.len().min(max);
        Some(buffer.drain(..take).collect())
    }

    async fn export_with_retry(&self, batch: Vec<Span>) {
        let stats = &self.shared.stats;
        let mut attempt: u32 = 0;

        loop {
            let outcome = timeout(self.config.export_timeout, self.exporter.export(&batch)).await;
            let reason = match outcome {
                Ok(Ok(())) => {
                    stats
                        .spans_exported
                        .fetch_add(batch.len() as u64, Ordering::Relaxed);
                    stats.batches_exported.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                Ok(Err(ExportError::Permanent(reason))) => {
                    tracing::warn!(
                        error = %reason,
                        spans = batch.len(),
                        "dropping batch rejected by collector"
                    );
                    stats
                        .spans_failed
                        .fetch_add(batch.len() as u64, Ordering::Relaxed);
                    stats.batches_failed.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                Ok(Err(ExportError::Transient(reason))) => reason,
                Err(_) => "export timed out".to_string(),
            };

            if attempt >= self.config.max_retries {
                tracing::warn!(
                    error = %reason,
                    retries = attempt,
                    spans = batch.len(),
                    "export retries exhausted, dropping batch"
                );
                stats
                    .spans_failed
                    .fetch_add(batch.len() as u64, Ordering::Relaxed);
                stats.batches_failed.fetch_add(1, Ordering::Relaxed);
                return;
            }

            let delay = self.config.retry_initial_backoff * 2u32.saturating_pow(attempt);
            attempt += 1;
            stats.export_retries.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                error = %reason,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "export failed, backing off"
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::MemoryExporter;
    use std::time::Duration;
    use traceline_core::SpanContext;

    fn ended_span(name: &str) -> Span {
        let mut span = Span::start(SpanContext::new_root(true), name);
        span.end();
        span
    }

    fn unsampled_span(name: &str) -> Span {
        let mut span = Span::start(SpanContext::new_root(false), name);
        span.end();
        span
    }

    fn quiet_config() -> PipelineConfig {
        // Timer effectively disabled so tests control flushes.
        PipelineConfig {
            max_batch_size: 100,
            queue_capacity: 1000,
            flush_interval: Duration::from_secs(3600),
            export_timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_initial_backoff: Duration::from_millis(10),
            shutdown_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn size_trigger_flushes_full_batches_only() {
        let exporter = Arc::new(MemoryExporter::new());
        let config = PipelineConfig {
            max_batch_size: 2,
            ..quiet_config()
        };
        let processor = BatchProcessor::spawn(config, exporter.clone());

        for i in 0..3 {
            processor.submit(ended_span(&format!("span-{}", i)));
        }
        sleep(Duration::from_millis(200)).await;

        // Two spans left as a full batch, one waits for timer or shutdown.
        assert_eq!(exporter.batch_sizes(), vec![2]);

        processor.shutdown().await;
        assert_eq!(exporter.batch_sizes(), vec![2, 1]);
        assert_eq!(
            exporter.span_names(),
            vec!["span-0", "span-1", "span-2"]
        );
    }

    #[tokio::test]
    async fn interval_trigger_flushes_partial_buffer() {
        let exporter = Arc::new(MemoryExporter::new());
        let config = PipelineConfig {
            flush_interval: Duration::from_millis(50),
            ..quiet_config()
        };
        let processor = BatchProcessor::spawn(config, exporter.clone());

        for i in 0..3 {
            processor.submit(ended_span(&format!("span-{}", i)));
        }
        sleep(Duration::from_millis(300)).await;

        assert_eq!(exporter.batch_sizes(), vec![3]);
        processor.shutdown().await;
    }

    #[tokio::test]
    async fn overflow_drops_oldest_and_counts() {
        let exporter = Arc::new(MemoryExporter::new());
        let config = PipelineConfig {
            queue_capacity: 4,
            ..quiet_config()
        };
        let processor = BatchProcessor::spawn(config, exporter.clone());

        for i in 0..10 {
            processor.submit(ended_span(&format!("span-{}", i)));
        }

        let stats = processor.stats();
        assert_eq!(stats.spans_submitted, 10);
        assert_eq!(stats.spans_dropped, 6);

        processor.shutdown().await;
        // The oldest six were evicted; the newest four survive.
        assert_eq!(
            exporter.span_names(),
            vec!["span-6", "span-7", "span-8", "span-9"]
        );
    }

    #[tokio::test]
    async fn transient_failures_retry_until_success() {
        let exporter = Arc::new(MemoryExporter::fail_first(2));
        let config = PipelineConfig {
            max_batch_size: 1,
            ..quiet_config()
        };
        let processor = BatchProcessor::spawn(config, exporter.clone());

        processor.submit(ended_span("retried"));
        sleep(Duration::from_millis(500)).await;

        let stats = processor.stats();
        assert_eq!(stats.export_retries, 2);
        assert_eq!(stats.batches_exported, 1);
        assert_eq!(stats.batches_failed, 0);
        assert_eq!(exporter.span_names(), vec!["retried"]);

        processor.shutdown().await;
    }

    #[tokio::test]
    async fn exhausted_retries_drop_the_batch() {
        let exporter = Arc::new(MemoryExporter::fail_first(10));
        let config = PipelineConfig {
            max_batch_size: 1,
            max_retries: 2,
            ..quiet_config()
        };
        let processor = BatchProcessor::spawn(config, exporter.clone());

        processor.submit(ended_span("doomed"));
        sleep(Duration::from_millis(500)).await;

        let stats = processor.stats();
        assert_eq!(stats.export_retries, 2);
        assert_eq!(stats.batches_failed, 1);
        assert_eq!(stats.spans_failed, 1);
        assert!(exporter.batches().is_empty());

        processor.shutdown().await;
    }

    #[tokio::test]
    async fn permanent_failure_skips_retries() {
        let exporter = Arc::new(MemoryExporter::fail_first_permanent(1));
        let config = PipelineConfig {
            max_batch_size: 1,
            ..quiet_config()
        };
        let processor = BatchProcessor::spawn(config, exporter.clone());

        processor.submit(ended_span("malformed"));
        sleep(Duration::from_millis(200)).await;

        let stats = processor.stats();
        assert_eq!(stats.export_retries, 0);
        assert_eq!(stats.batches_failed, 1);

        processor.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_drains_remaining_spans() {
        let exporter = Arc::new(MemoryExporter::new());
        let processor = BatchProcessor::spawn(quiet_config(), exporter.clone());

        for i in 0..3 {
            processor.submit(ended_span(&format!("span-{}", i)));
        }
        processor.shutdown().await;

        assert!(processor.is_stopped());
        assert_eq!(exporter.batch_sizes(), vec![3]);
    }

    #[tokio::test]
    async fn submissions_after_stop_are_counted_noops() {
        let exporter = Arc::new(MemoryExporter::new());
        let processor = BatchProcessor::spawn(quiet_config(), exporter.clone());

        processor.shutdown().await;
        processor.submit(ended_span("late"));
        processor.submit(ended_span("later"));

        let stats = processor.stats();
        assert_eq!(stats.spans_rejected, 2);
        assert!(exporter.batches().is_empty());
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let exporter = Arc::new(MemoryExporter::new());
        let processor = BatchProcessor::spawn(quiet_config(), exporter.clone());

        processor.submit(ended_span("only"));
        processor.shutdown().await;
        processor.shutdown().await;

        assert_eq!(exporter.batch_sizes(), vec![1]);
    }

    #[tokio::test]
    async fn unsampled_spans_never_reach_the_buffer() {
        let exporter = Arc::new(MemoryExporter::new());
        let processor = BatchProcessor::spawn(quiet_config(), exporter.clone());

        processor.submit(unsampled_span("invisible"));
        processor.submit(ended_span("visible"));
        processor.shutdown().await;

        let stats = processor.stats();
        assert_eq!(stats.spans_unsampled, 1);
        assert_eq!(stats.spans_submitted, 1);
        assert_eq!(exporter.span_names(), vec!["visible"]);
    }
}
