//! API integration tests against a running server
//!
//! Start the server first (e.g. `RUN_MODE=development cargo run`).

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to create a usage-based schedule for fresh equipment
async fn create_usage_schedule(client: &Client, equipment_id: &str) -> Value {
    let response = client
        .post(format!("{}/schedules", BASE_URL))
        .json(&json!({
            "equipment_id": equipment_id,
            "name": "Engine service",
            "trigger_type": "usage_based",
            "usage_interval": 500.0,
            "usage_metric": "hours",
            "last_service_reading": 10000.0
        }))
        .send()
        .await
        .expect("Failed to send create request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse schedule")
}

async fn record_hours(client: &Client, equipment_id: &str, value: f64, recorded_at: &str) -> reqwest::Response {
    client
        .post(format!("{}/usage-readings", BASE_URL))
        .json(&json!({
            "equipment_id": equipment_id,
            "reading_type": "hours",
            "reading_value": value,
            "recorded_at": recorded_at
        }))
        .send()
        .await
        .expect("Failed to send reading")
}

fn new_equipment_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_usage_reading_makes_schedule_due() {
    let client = Client::new();
    let equipment_id = new_equipment_id();
    let schedule = create_usage_schedule(&client, &equipment_id).await;
    assert_eq!(schedule["needs_attention"], true);

    let now = chrono::Utc::now();
    let earlier = (now - chrono::Duration::days(10)).to_rfc3339();
    let response = record_hours(&client, &equipment_id, 10100.0, &earlier).await;
    assert_eq!(response.status(), 201);
    let response = record_hours(&client, &equipment_id, 10500.0, &now.to_rfc3339()).await;
    assert_eq!(response.status(), 201);

    let id = schedule["id"].as_str().expect("No schedule id");
    let response = client
        .get(format!("{}/schedules/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["usage_due_now"], true);
    assert_eq!(body["status"], "due_soon");
}

#[tokio::test]
#[ignore]
async fn test_negative_reading_rejected() {
    let client = Client::new();
    let response = record_hours(
        &client,
        &new_equipment_id(),
        -5.0,
        &chrono::Utc::now().to_rfc3339(),
    )
    .await;

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "InvalidReading");
}

#[tokio::test]
#[ignore]
async fn test_inconsistent_schedule_rejected() {
    let client = Client::new();

    let response = client
        .post(format!("{}/schedules", BASE_URL))
        .json(&json!({
            "equipment_id": new_equipment_id(),
            "name": "Broken",
            "trigger_type": "usage_based",
            "usage_interval": 500.0
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_due_listing() {
    let client = Client::new();

    let response = client
        .get(format!("{}/schedules/due?filter=needs_attention", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_manual_sweep() {
    let client = Client::new();

    let response = client
        .post(format!("{}/sweep", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["failed"], 0);
}
