//! Integration tests for the attrition API endpoints

use attrition_lib::{
    health::{Component, ComponentStatus, HealthRegistry},
    AttritionService, ModelResolver,
};
use attrition_server::{create_router, AppState};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Single stump on OverTime_Yes: overtime means attrition with p = 0.8
const FOREST_DOC: &str = r#"{
    "kind": "random_forest",
    "feature_names": ["MonthlyIncome", "Age", "TotalWorkingYears", "OverTime_Yes",
        "DailyRate", "YearsAtCompany", "HourlyRate", "DistanceFromHome",
        "MonthlyRate", "NumCompaniesWorked"],
    "classes": [0, 1],
    "trees": [{"nodes": [
        {"feature": 3, "threshold": 0.5, "left": 1, "right": 2},
        {"value": [9, 1]},
        {"value": [2, 8]}
    ]}]
}"#;

fn model_path(dir: &TempDir) -> PathBuf {
    dir.path().join("model").join("rf_model.json")
}

fn write_model(dir: &TempDir, contents: &str) {
    let path = model_path(dir);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

async fn setup_test_app(dir: &TempDir) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.set_ready(true).await;

    let resolver = ModelResolver::new(vec![model_path(dir)]).unwrap();
    let service = Arc::new(AttritionService::new(resolver, "api-test"));
    let state = Arc::new(AppState::new(service, health_registry));
    let router = create_router(state.clone());

    (router, state)
}

fn reference_input(overtime: &str) -> Value {
    json!({
        "MonthlyIncome": 5000,
        "Age": 30,
        "TotalWorkingYears": 8,
        "OverTime": overtime,
        "DailyRate": 800,
        "YearsAtCompany": 5,
        "HourlyRate": 50,
        "DistanceFromHome": 5,
        "MonthlyRate": 20000,
        "NumCompaniesWorked": 2
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_predict_returns_high_risk_decision() {
    let dir = TempDir::new().unwrap();
    write_model(&dir, FOREST_DOC);
    let (app, _state) = setup_test_app(&dir).await;

    let response = app
        .oneshot(post_json("/api/v1/predict", &reference_input("Yes")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let decision = body_json(response).await;
    assert_eq!(decision["label"], "high_risk");
    assert!((decision["probability"].as_f64().unwrap() - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn test_predict_returns_low_risk_decision() {
    let dir = TempDir::new().unwrap();
    write_model(&dir, FOREST_DOC);
    let (app, _state) = setup_test_app(&dir).await;

    let response = app
        .oneshot(post_json("/api/v1/predict", &reference_input("No")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let decision = body_json(response).await;
    assert_eq!(decision["label"], "low_risk");
}

#[tokio::test]
async fn test_predict_missing_field_is_422() {
    let dir = TempDir::new().unwrap();
    write_model(&dir, FOREST_DOC);
    let (app, _state) = setup_test_app(&dir).await;

    let mut input = reference_input("Yes");
    input.as_object_mut().unwrap().remove("Age");

    let response = app
        .oneshot(post_json("/api/v1/predict", &input))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "schema");
    assert!(body["message"].as_str().unwrap().contains("Age"));
}

#[tokio::test]
async fn test_predict_invalid_overtime_is_422() {
    let dir = TempDir::new().unwrap();
    write_model(&dir, FOREST_DOC);
    let (app, _state) = setup_test_app(&dir).await;

    let response = app
        .oneshot(post_json("/api/v1/predict", &reference_input("Sometimes")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_predict_malformed_body_is_400() {
    let dir = TempDir::new().unwrap();
    write_model(&dir, FOREST_DOC);
    let (app, _state) = setup_test_app(&dir).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/predict")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_predict_ignores_extra_null_field() {
    let dir = TempDir::new().unwrap();
    write_model(&dir, FOREST_DOC);
    let (app, _state) = setup_test_app(&dir).await;

    let mut input = reference_input("Yes");
    input["Manager"] = Value::Null;
    input["Tags"] = json!(["remote", "senior"]);

    let response = app
        .oneshot(post_json("/api/v1/predict", &input))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["label"], "high_risk");
}

#[tokio::test]
async fn test_predict_boolean_for_integer_field_is_422() {
    let dir = TempDir::new().unwrap();
    write_model(&dir, FOREST_DOC);
    let (app, _state) = setup_test_app(&dir).await;

    let mut input = reference_input("Yes");
    input["Age"] = json!(true);

    let response = app
        .oneshot(post_json("/api/v1/predict", &input))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "schema");
    assert!(body["message"].as_str().unwrap().contains("Age"));
}

#[tokio::test]
async fn test_predict_without_model_is_503_and_degraded() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_test_app(&dir).await;

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/predict", &reference_input("Yes")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"], "model_unavailable");
    assert!(body["message"].as_str().unwrap().contains("rf_model.json"));

    let model = state.health_registry.component(Component::Model).await.unwrap();
    assert_eq!(model.status, ComponentStatus::Degraded);

    // Degraded still returns 200 (operational)
    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_corrupt_model_makes_service_unhealthy() {
    let dir = TempDir::new().unwrap();
    write_model(&dir, "{ truncated");
    let (app, _state) = setup_test_app(&dir).await;

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/predict", &reference_input("Yes")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app.clone().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["status"], "unhealthy");

    let response = app.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_model_status_reports_artifact() {
    let dir = TempDir::new().unwrap();
    write_model(&dir, FOREST_DOC);
    let (app, _state) = setup_test_app(&dir).await;

    let response = app.oneshot(get("/api/v1/model")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["status"], "loaded");
    assert_eq!(status["artifact"]["kind"], "random_forest");
    assert_eq!(status["artifact"]["format"], "json");
    assert_eq!(status["artifact"]["checksum"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_reload_picks_up_new_artifact() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_test_app(&dir).await;

    let response = app.clone().oneshot(get("/api/v1/model")).await.unwrap();
    assert_eq!(body_json(response).await["status"], "not_found");

    write_model(&dir, FOREST_DOC);
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/model/reload")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "loaded");
    let model = state.health_registry.component(Component::Model).await.unwrap();
    assert_eq!(model.status, ComponentStatus::Healthy);
}

#[tokio::test]
async fn test_model_health_follows_each_request() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_test_app(&dir).await;

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/predict", &reference_input("No")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let model = state.health_registry.component(Component::Model).await.unwrap();
    assert_eq!(model.status, ComponentStatus::Degraded);

    write_model(&dir, FOREST_DOC);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(post_json("/api/v1/predict", &reference_input("Yes")))
                .await
                .unwrap()
                .status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
    let model = state.health_registry.component(Component::Model).await.unwrap();
    assert_eq!(model.status, ComponentStatus::Healthy);

    write_model(&dir, "{ truncated");
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/model/reload")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(body_json(response).await["status"], "load_error");
    let model = state.health_registry.component(Component::Model).await.unwrap();
    assert_eq!(model.status, ComponentStatus::Unhealthy);
}

#[tokio::test]
async fn test_schema_lists_fields_in_order() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = setup_test_app(&dir).await;

    let response = app.oneshot(get("/api/v1/schema")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let schema = body_json(response).await;
    let fields = schema.as_array().unwrap();
    assert_eq!(fields.len(), 10);
    assert_eq!(fields[0]["name"], "MonthlyIncome");
    assert_eq!(fields[3]["name"], "OverTime");
    assert_eq!(fields[3]["type"], "over_time");
    assert_eq!(fields[1]["min"], 18);
}

#[tokio::test]
async fn test_readyz_returns_503_when_not_ready() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_test_app(&dir).await;
    state.health_registry.set_ready(false).await;

    let response = app.oneshot(get("/readyz")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let readiness = body_json(response).await;
    assert_eq!(readiness["ready"], false);
    assert!(readiness["reason"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_decisions() {
    let dir = TempDir::new().unwrap();
    write_model(&dir, FOREST_DOC);
    let (app, _state) = setup_test_app(&dir).await;

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/predict", &reference_input("Yes")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("attrition_decisions_total"));
    assert!(text.contains("attrition_prediction_latency_seconds"));
}
