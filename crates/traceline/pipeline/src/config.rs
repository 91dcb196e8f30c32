//! Pipeline tuning knobs.

use std::time::Duration;

/// Buffering, flush, retry, and shutdown parameters. All values are fixed
/// at startup.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Spans per exported batch; also the size-based flush trigger.
    pub max_batch_size: usize,

    /// Bounded buffer capacity. Beyond it the oldest unflushed span is
    /// dropped and counted.
    pub queue_capacity: usize,

    /// Time-based flush trigger.
    pub flush_interval: Duration,

    /// Per-attempt export deadline; elapse counts as a transient failure.
    pub export_timeout: Duration,

    /// Retries per batch after the first attempt.
    pub max_retries: u32,

    /// First retry delay; doubles per retry.
    pub retry_initial_backoff: Duration,

    /// How long shutdown waits for the final drain before discarding
    /// whatever is still pending.
    pub shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 512,
            queue_capacity: 2048,
            flush_interval: Duration::from_secs(5),
            export_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_initial_backoff: Duration::from_millis(100),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = PipelineConfig::default();
        assert!(config.max_batch_size <= config.queue_capacity);
        assert!(config.retry_initial_backoff < config.export_timeout);
    }
}
