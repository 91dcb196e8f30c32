//! Router-level tests driving the demo endpoints end to end: HTTP in,
//! spans out through the pipeline, correlated log lines on the side.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use traceline_core::{AttrValue, SpanStatus, Tracer};
use traceline_demo::{build_router, AppState};
use traceline_log::{CorrelatedLogger, MemorySink};
use traceline_pipeline::{BatchProcessor, MemoryExporter, PipelineConfig};

struct Harness {
    state: AppState,
    exporter: Arc<MemoryExporter>,
    log_sink: Arc<MemorySink>,
    processor: Arc<BatchProcessor>,
}

fn harness() -> Harness {
    let exporter = Arc::new(MemoryExporter::new());
    let config = PipelineConfig {
        max_batch_size: 10,
        queue_capacity: 100,
        flush_interval: Duration::from_secs(3600),
        export_timeout: Duration::from_secs(5),
        max_retries: 0,
        retry_initial_backoff: Duration::from_millis(10),
        shutdown_timeout: Duration::from_secs(5),
    };
    let processor = BatchProcessor::spawn(config, exporter.clone());
    let log_sink = Arc::new(MemorySink::new());

    let state = AppState::new(
        Arc::new(Tracer::new(processor.clone())),
        Arc::new(CorrelatedLogger::with_sink(log_sink.clone())),
        processor.clone(),
    );

    Harness {
        state,
        exporter,
        log_sink,
        processor,
    }
}

async fn get(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = build_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn success_endpoint_emits_an_ok_span_and_correlated_logs() {
    let h = harness();

    let (status, body) = get(h.state, "/success").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Success");
    assert_eq!(body["status"], "ok");

    h.processor.shutdown().await;

    assert_eq!(h.exporter.span_names(), vec!["success_operation"]);
    let batches = h.exporter.batches();
    let span = &batches[0][0];
    assert!(span.is_ended());
    assert!(span.context.parent_span_id.is_none());
    assert_eq!(span.status, SpanStatus::Ok);
    assert_eq!(
        span.attributes.get("endpoint.status"),
        Some(&AttrValue::String("success".to_string()))
    );
    assert_eq!(
        span.attributes.get("operation.duration"),
        Some(&AttrValue::String("fast".to_string()))
    );

    // Both log lines carry the span's identity.
    let lines = h.log_sink.lines();
    assert_eq!(lines.len(), 2);
    let stamp = format!(
        "[trace_id={}, span_id={}]",
        span.context.trace_id, span.context.span_id
    );
    assert!(lines.iter().all(|l| l.contains(&stamp)));
}

#[tokio::test]
async fn error_endpoint_returns_500_with_an_error_span() {
    let h = harness();

    let (status, body) = get(h.state, "/error").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Simulated error occurred");
    assert_eq!(body["code"], "SIMULATED_FAILURE");

    h.processor.shutdown().await;

    assert_eq!(h.exporter.span_names(), vec!["error_operation"]);
    let batches = h.exporter.batches();
    let span = &batches[0][0];
    assert!(span.is_ended());
    assert!(matches!(span.status, SpanStatus::Error { .. }));
    assert_eq!(
        span.attributes.get("error.type"),
        Some(&AttrValue::String("simulated_failure".to_string()))
    );
    assert_eq!(span.events.len(), 1);
    assert_eq!(span.events[0].name, "error_triggered");
    assert_eq!(
        span.events[0].attributes.get("reason"),
        Some(&AttrValue::String("manual_simulation".to_string()))
    );

    let lines = h.log_sink.lines();
    assert!(lines.iter().any(|l| l.contains("[ERROR]")));
}

#[tokio::test]
async fn requests_get_distinct_traces() {
    let h = harness();

    let (first, _) = get(h.state.clone(), "/success").await;
    let (second, _) = get(h.state.clone(), "/success").await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);

    h.processor.shutdown().await;

    let batches = h.exporter.batches();
    let spans: Vec<_> = batches.iter().flatten().collect();
    assert_eq!(spans.len(), 2);
    assert_ne!(spans[0].context.trace_id, spans[1].context.trace_id);
}

#[tokio::test]
async fn healthz_reports_version_and_uptime() {
    let h = harness();

    let (status, body) = get(h.state, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime"].is_string());

    h.processor.shutdown().await;
}

#[tokio::test]
async fn stats_expose_pipeline_counters() {
    let h = harness();

    let (status, _) = get(h.state.clone(), "/success").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(h.state, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pipeline"]["spans_submitted"], 1);
    assert_eq!(body["pipeline"]["spans_dropped"], 0);

    h.processor.shutdown().await;
}
