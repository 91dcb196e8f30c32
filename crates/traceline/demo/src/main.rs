//! Demo service binary.

use clap::Parser;
use traceline_demo::config::DemoConfig;
use traceline_demo::error::{DemoError, DemoResult};
use traceline_demo::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Demo service CLI
#[derive(Parser)]
#[command(name = "traceline-demo")]
#[command(about = "Demo service emitting spans and trace-correlated logs", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TRACELINE_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "TRACELINE_LISTEN_ADDR")]
    listen: Option<String>,

    /// Service name reported to the collector
    #[arg(long, env = "OTEL_SERVICE_NAME")]
    service_name: Option<String>,

    /// Collector endpoint spans are exported to
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    collector_endpoint: Option<String>,

    /// Log level
    #[arg(long, env = "TRACELINE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "TRACELINE_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DemoResult<()> {
    let cli = Cli::parse();

    // Initialize process diagnostics; the request-scoped correlated logger
    // is separate and wired inside the server.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let mut config =
        DemoConfig::load(cli.config.as_deref()).map_err(|e| DemoError::Config(e.to_string()))?;

    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DemoError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(name) = cli.service_name {
        config.telemetry.service_name = name;
    }
    if let Some(endpoint) = cli.collector_endpoint {
        config.telemetry.collector_endpoint = endpoint;
    }

    Server::new(config).run().await
}
