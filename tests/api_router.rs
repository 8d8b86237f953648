//! In-process HTTP tests: the full router over the in-memory store

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use shopcare_maintenance::{
    api,
    config::{
        AppConfig, DatabaseConfig, LoggingConfig, SchedulingConfig, ServerConfig, StorageBackend,
        StorageConfig,
    },
    repository::memory::MemoryRepository,
    services::{clock::ManualClock, Services},
    AppState,
};

fn build_test_app() -> Router {
    let repo = MemoryRepository::new();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    let config = AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        logging: LoggingConfig::default(),
        storage: StorageConfig {
            backend: StorageBackend::Memory,
        },
        scheduling: SchedulingConfig::default(),
    };
    let services = Services::new(
        Arc::new(repo.clone()),
        Arc::new(repo),
        config.scheduling.clone(),
        Arc::new(clock),
    );

    api::create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = build_test_app();

    let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/api/v1/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_schedule_lifecycle_over_http() {
    let app = build_test_app();
    let equipment_id = Uuid::new_v4();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/schedules",
        Some(json!({
            "equipment_id": equipment_id,
            "name": "Engine service",
            "trigger_type": "usage_based",
            "usage_interval": 500.0,
            "usage_metric": "hours",
            "last_service_reading": 10000.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["needs_attention"], true);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, recorded) = send(
        &app,
        Method::POST,
        "/api/v1/usage-readings",
        Some(json!({
            "equipment_id": equipment_id,
            "reading_type": "hours",
            "reading_value": 10500.0,
            "recorded_at": "2024-03-01T11:00:00Z",
            "operation_type": "work-order"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(recorded["schedules_recomputed"], 1);

    let (status, due) = send(&app, Method::GET, "/api/v1/schedules/due?filter=due_soon", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(due.as_array().unwrap().len(), 1);
    assert_eq!(due[0]["id"], id.as_str());

    let (status, completed) = send(
        &app,
        Method::POST,
        &format!("/api/v1/schedules/{}/complete", id),
        Some(json!({ "completion_date": "2024-03-01", "completion_reading": 10600.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["next_service_reading"], 11100.0);
    assert_eq!(completed["status"], "scheduled");

    let (status, history) = send(
        &app,
        Method::GET,
        &format!("/api/v1/equipment/{}/usage-readings?metric=hours&since=2024-01-01", equipment_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history[0]["operation_type"], "work-order");
}

#[tokio::test]
async fn test_error_mapping() {
    let app = build_test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/usage-readings",
        Some(json!({
            "equipment_id": Uuid::new_v4(),
            "reading_type": "hours",
            "reading_value": -3.0,
            "recorded_at": "2024-03-01T11:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "InvalidReading");
    assert_eq!(body["code"], 30);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/schedules",
        Some(json!({
            "equipment_id": Uuid::new_v4(),
            "name": "No interval",
            "trigger_type": "time_based"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "InvalidConfiguration");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/schedules/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchSchedule");
}

#[tokio::test]
async fn test_cancelled_schedule_conflicts() {
    let app = build_test_app();

    let (_, created) = send(
        &app,
        Method::POST,
        "/api/v1/schedules",
        Some(json!({
            "equipment_id": Uuid::new_v4(),
            "name": "Annual inspection",
            "trigger_type": "time_based",
            "time_interval_days": 365
        })),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, cancelled) = send(&app, Method::POST, &format!("/api/v1/schedules/{}/cancel", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/schedules/{}/lock", id),
        Some(json!({ "locked_service_date": "2024-06-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "InvalidTransition");
}

#[tokio::test]
async fn test_manual_sweep_report() {
    let app = build_test_app();

    let (status, report) = send(&app, Method::POST, "/api/v1/sweep", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["examined"], 0);
    assert_eq!(report["evaluated_on"], "2024-03-01");
}
