//! HTTP/JSON collector exporter.
//!
//! Posts each batch as one JSON envelope. The collector's own wire format
//! is out of scope here; the envelope is the pipeline's native serde form.

use crate::exporter::{ExportError, SpanExporter};
use async_trait::async_trait;
use serde::Serialize;
use traceline_core::Span;

#[derive(Debug, Serialize)]
struct ResourceInfo<'a> {
    service_name: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchEnvelope<'a> {
    resource: ResourceInfo<'a>,
    spans: &'a [Span],
}

/// Sends span batches to a collector endpoint over HTTP.
pub struct HttpExporter {
    client: reqwest::Client,
    endpoint: String,
    service_name: String,
}

impl HttpExporter {
    pub fn new(endpoint: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            service_name: service_name.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SpanExporter for HttpExporter {
    async fn export(&self, batch: &[Span]) -> Result<(), ExportError> {
        let envelope = BatchEnvelope {
            resource: ResourceInfo {
                service_name: &self.service_name,
            },
            spans: batch,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| ExportError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.is_client_error() {
            // The collector judged the batch malformed; resending the same
            // bytes cannot help.
            Err(ExportError::Permanent(format!(
                "collector rejected batch: {}",
                status
            )))
        } else {
            Err(ExportError::Transient(format!(
                "collector returned {}",
                status
            )))
        }
    }
}
