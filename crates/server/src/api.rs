//! HTTP API for attrition scoring, health checks and Prometheus metrics

use attrition_lib::{
    health::{ComponentStatus, HealthRegistry},
    predictor::INPUT_FIELDS,
    AssessError, AttritionService, ModelStatus, RawFields, ResolutionResult,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AttritionService>,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(service: Arc<AttritionService>, health_registry: HealthRegistry) -> Self {
        Self {
            service,
            health_registry,
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

fn error_response(status: StatusCode, kind: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: kind.to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

fn assess_error_response(err: &AssessError) -> Response {
    let status = match err {
        AssessError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AssessError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AssessError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.kind(), err.to_string())
}

/// Score one employee record
async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RawFields>, JsonRejection>,
) -> Response {
    let Json(raw) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, "bad_request", rejection.body_text())
        }
    };

    let service = state.service.clone();
    let outcome = tokio::task::spawn_blocking(move || service.evaluate(&raw)).await;

    match outcome {
        Ok(assessment) => {
            state
                .health_registry
                .record_resolution(&assessment.resolution)
                .await;
            state
                .health_registry
                .record_assessment(&assessment.outcome)
                .await;
            match assessment.outcome {
                Ok(decision) => (StatusCode::OK, Json(decision)).into_response(),
                Err(err) => assess_error_response(&err),
            }
        }
        Err(join_error) => {
            error!(error = %join_error, "Prediction task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "prediction task failed",
            )
        }
    }
}

async fn model_status(State(state): State<Arc<AppState>>) -> Response {
    let service = state.service.clone();
    let outcome = tokio::task::spawn_blocking(move || service.resolution()).await;
    status_response(&state, outcome).await
}

async fn reload_model(State(state): State<Arc<AppState>>) -> Response {
    info!("Model reload requested");
    let service = state.service.clone();
    let outcome = tokio::task::spawn_blocking(move || service.reload()).await;
    status_response(&state, outcome).await
}

/// Record the resolution a handler just ran and report it
async fn status_response(
    state: &AppState,
    outcome: Result<ResolutionResult, tokio::task::JoinError>,
) -> Response {
    match outcome {
        Ok(result) => {
            state.health_registry.record_resolution(&result).await;
            (StatusCode::OK, Json(ModelStatus::from(&result))).into_response()
        }
        Err(join_error) => {
            error!(error = %join_error, "Model resolution task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "model resolution task failed",
            )
        }
    }
}

/// Ordered input schema with bounds and defaults
async fn schema() -> impl IntoResponse {
    Json(INPUT_FIELDS)
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string());
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/predict", post(predict))
        .route("/api/v1/model", get(model_status))
        .route("/api/v1/model/reload", post(reload_model))
        .route("/api/v1/schema", get(schema))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
