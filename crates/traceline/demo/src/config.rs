//! Configuration for the demo service.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use traceline_pipeline::PipelineConfig;

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Telemetry pipeline configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            telemetry: TelemetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".parse().unwrap(),
        }
    }
}

/// Telemetry pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name reported to the collector
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Collector endpoint batches are posted to
    #[serde(default = "default_collector_endpoint")]
    pub collector_endpoint: String,

    /// Spans per exported batch
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Bounded buffer capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Time-based flush trigger in milliseconds
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Per-attempt export deadline in milliseconds
    #[serde(default = "default_export_timeout_ms")]
    pub export_timeout_ms: u64,

    /// Retries per batch after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay in milliseconds; doubles per retry
    #[serde(default = "default_retry_initial_backoff_ms")]
    pub retry_initial_backoff_ms: u64,

    /// Shutdown drain deadline in milliseconds
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            collector_endpoint: default_collector_endpoint(),
            max_batch_size: default_max_batch_size(),
            queue_capacity: default_queue_capacity(),
            flush_interval_ms: default_flush_interval_ms(),
            export_timeout_ms: default_export_timeout_ms(),
            max_retries: default_max_retries(),
            retry_initial_backoff_ms: default_retry_initial_backoff_ms(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

impl TelemetryConfig {
    /// Convert to the pipeline's own config type.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            max_batch_size: self.max_batch_size,
            queue_capacity: self.queue_capacity,
            flush_interval: Duration::from_millis(self.flush_interval_ms),
            export_timeout: Duration::from_millis(self.export_timeout_ms),
            max_retries: self.max_retries,
            retry_initial_backoff: Duration::from_millis(self.retry_initial_backoff_ms),
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_service_name() -> String {
    "traceline-demo".to_string()
}

fn default_collector_endpoint() -> String {
    "http://127.0.0.1:4318/v1/traces".to_string()
}

fn default_max_batch_size() -> usize {
    512
}

fn default_queue_capacity() -> usize {
    2048
}

fn default_flush_interval_ms() -> u64 {
    5000
}

fn default_export_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_initial_backoff_ms() -> u64 {
    100
}

fn default_shutdown_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DemoConfig {
    /// Load configuration: defaults, then an optional file, then
    /// `TRACELINE_`-prefixed environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DemoConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("TRACELINE")
                .separator("_")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
