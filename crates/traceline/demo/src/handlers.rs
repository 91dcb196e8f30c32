//! Request handlers for the demo endpoints.
//!
//! Each handler is one execution unit: it opens its own trace scope, works
//! under a span guard, and logs through the correlated logger. The guard
//! ends the span on every exit path, including the error endpoint's 500.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{extract::State, Json};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::time::Duration;
use traceline_core::{SpanStatus, TraceScope};
use traceline_pipeline::StatsSnapshot;

/// Success response body
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
    pub status: String,
}

/// The happy-path endpoint: a fast operation that succeeds.
pub async fn success(State(state): State<AppState>) -> Json<SuccessResponse> {
    let scope = TraceScope::new();
    let mut span = state.tracer.start_span(&scope, "success_operation");

    simulate_work(100..=300).await;

    span.set_attribute("endpoint.status", "success");
    span.set_attribute("operation.duration", "fast");

    state.logger.info(&scope, "success endpoint called");
    state
        .logger
        .info(&scope, "completing success operation, returning 200");

    span.set_status(SpanStatus::Ok);
    span.end();

    Json(SuccessResponse {
        message: "Success".to_string(),
        status: "ok".to_string(),
    })
}

/// The failing endpoint: records an error span and returns 500.
pub async fn error(State(state): State<AppState>) -> ApiResult<Json<SuccessResponse>> {
    let scope = TraceScope::new();
    let mut span = state.tracer.start_span(&scope, "error_operation");

    simulate_work(100..=500).await;

    span.set_attribute("endpoint.status", "error");
    span.set_attribute("error.type", "simulated_failure");

    let mut attributes = HashMap::new();
    attributes.insert("reason".to_string(), "manual_simulation".into());
    span.add_event_with_attributes("error_triggered", attributes);
    span.set_status(SpanStatus::Error {
        message: "simulated failure".to_string(),
    });

    state.logger.info(&scope, "error endpoint called");
    state
        .logger
        .error(&scope, "simulated error occurred, returning 500");

    // The guard ends the span on this early return.
    Err(ApiError::SimulatedFailure)
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Liveness endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

/// Pipeline statistics response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub uptime: String,
    pub pipeline: StatsSnapshot,
}

/// Pipeline counter snapshot.
pub async fn pipeline_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        started_at: state.started_at,
        uptime: state.uptime(),
        pipeline: state.processor.stats(),
    })
}

async fn simulate_work(millis: RangeInclusive<u64>) {
    let delay = rand::thread_rng().gen_range(millis);
    tokio::time::sleep(Duration::from_millis(delay)).await;
}
