//! Shared application state for handlers.

use std::sync::Arc;
use traceline_core::Tracer;
use traceline_log::CorrelatedLogger;
use traceline_pipeline::BatchProcessor;

/// Cloneable state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Span factory
    pub tracer: Arc<Tracer>,

    /// Trace-correlated logger
    pub logger: Arc<CorrelatedLogger>,

    /// Export pipeline handle, for stats and shutdown
    pub processor: Arc<BatchProcessor>,

    /// Service version
    pub version: String,

    /// Service start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(
        tracer: Arc<Tracer>,
        logger: Arc<CorrelatedLogger>,
        processor: Arc<BatchProcessor>,
    ) -> Self {
        Self {
            tracer,
            logger,
            processor,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let duration = chrono::Utc::now() - self.started_at;
        let secs = duration.num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
