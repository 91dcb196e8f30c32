//! Server setup and lifecycle management.

use crate::config::DemoConfig;
use crate::error::{DemoError, DemoResult};
use crate::routes::build_router;
use crate::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use traceline_core::Tracer;
use traceline_log::CorrelatedLogger;
use traceline_pipeline::{BatchProcessor, HttpExporter};

/// Demo service server.
pub struct Server {
    config: DemoConfig,
}

impl Server {
    pub fn new(config: DemoConfig) -> Self {
        Self { config }
    }

    /// Run the server until a shutdown signal, then drain the pipeline.
    pub async fn run(self) -> DemoResult<()> {
        let telemetry = &self.config.telemetry;

        let exporter = Arc::new(HttpExporter::new(
            telemetry.collector_endpoint.clone(),
            telemetry.service_name.clone(),
        ));
        let processor = BatchProcessor::spawn(telemetry.pipeline(), exporter);
        let tracer = Arc::new(Tracer::new(processor.clone()));
        let logger = Arc::new(CorrelatedLogger::new());

        let state = AppState::new(tracer, logger, processor.clone());
        let app = build_router(state);

        let listener = TcpListener::bind(self.config.server.listen_addr).await?;
        tracing::info!("demo service listening on {}", listener.local_addr()?);
        tracing::info!(
            service = %telemetry.service_name,
            endpoint = %telemetry.collector_endpoint,
            "exporting spans"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DemoError::Server(e.to_string()))?;

        tracing::info!("demo service shutting down, draining span pipeline");
        processor.shutdown().await;

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
