//! Integration tests for the inventory HTTP API
//!
//! These tests drive the full router, including:
//! - The one-time bootstrap import on the first request
//! - Listing with filters and unit conversion
//! - Adding and removing items
//! - Error handling and status codes

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::util::ServiceExt; // for `oneshot`

// Import from the main crate
use produce_store::inventory::{AppState, LatchState};
use produce_store::router::create_app_router;

const DATASET: &str = r#"[
    {"id": 1, "name": "Strawberries", "type": "fruit", "quantity": 10, "unit": "kg"},
    {"id": 2, "name": "Berries", "type": "fruit", "quantity": 10000, "unit": "g"},
    {"id": 3, "name": "Apples", "type": "fruit", "quantity": "1500", "unit": "G"},
    {"id": 4, "name": "Carrot", "type": "Vegetable", "quantity": 3, "unit": "kg"}
]"#;

fn write_dataset(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Helper function to create a test app seeded from `dataset`
fn create_test_app(dataset: &NamedTempFile) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(dataset.path(), false));
    (create_app_router(Arc::clone(&state)), state)
}

/// Helper function to send a request and get the JSON response
async fn send_request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, body)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    send_request(app, "GET", uri, None).await
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send_request(app, "POST", uri, Some(&body.to_string())).await
}

#[tokio::test]
async fn test_dataset_is_listed_in_grams() {
    let dataset = write_dataset(DATASET);
    let (app, _) = create_test_app(&dataset);

    let (status, body) = get(&app, "/api/fruit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": 1, "name": "Strawberries", "type": "fruit", "quantity": 10000, "unit": "g"},
            {"id": 2, "name": "Berries", "type": "fruit", "quantity": 10000, "unit": "g"},
            {"id": 3, "name": "Apples", "type": "fruit", "quantity": 1500, "unit": "g"}
        ])
    );

    let (status, body) = get(&app, "/api/VEGETABLE").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"id": 4, "name": "Carrot", "type": "vegetable", "quantity": 3000, "unit": "g"}])
    );
}

#[tokio::test]
async fn test_single_row_example() {
    let dataset = write_dataset(
        r#"[{"id":1,"name":"Strawberries","type":"fruit","quantity":10,"unit":"kg"}]"#,
    );
    let (app, _) = create_test_app(&dataset);

    let (status, body) = get(&app, "/api/fruit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"id": 1, "name": "Strawberries", "type": "fruit", "quantity": 10000, "unit": "g"}])
    );
}

#[tokio::test]
async fn test_list_with_filters_and_units() {
    let dataset = write_dataset(DATASET);
    let (app, _) = create_test_app(&dataset);

    let (status, body) = get(&app, "/api/fruit?unit=kg&q=ber&min=9000").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    let berries = rows.iter().find(|r| r["name"] == "Berries").unwrap();
    assert_eq!(berries["quantity"], 10);
    assert_eq!(berries["unit"], "kg");

    let (status, body) = get(&app, "/api/fruit?unit=kg&q=ber&min=11000").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["name"] == "Berries"));
}

#[tokio::test]
async fn test_fractional_kilograms() {
    let dataset = write_dataset(DATASET);
    let (app, _) = create_test_app(&dataset);

    let (_, body) = get(&app, "/api/fruit?unit=kg&max=2000").await;
    assert_eq!(
        body,
        json!([{"id": 3, "name": "Apples", "type": "fruit", "quantity": 1.5, "unit": "kg"}])
    );
}

#[tokio::test]
async fn test_invalid_query_parameters() {
    let dataset = write_dataset(DATASET);
    let (app, _) = create_test_app(&dataset);

    let cases = [
        ("/api/fruit?min=abc", "Parameter 'min' must be a positive integer (grams)"),
        ("/api/fruit?max=-5", "Parameter 'max' must be a positive integer (grams)"),
        ("/api/fruit?unit=lb", "Parameter 'unit' must be 'g' or 'kg'"),
        ("/api/fruit?min=10&max=5", "Parameter 'min' cannot be greater than 'max'"),
    ];

    for (uri, message) in cases {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], message, "{}", uri);
    }
}

#[tokio::test]
async fn test_unknown_collection() {
    let dataset = write_dataset(DATASET);
    let (app, _) = create_test_app(&dataset);

    let (status, body) = get(&app, "/api/meat").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unknown collection");

    let (status, _) = post(&app, "/api/meat", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_vegetable_and_retrieve() {
    let dataset = write_dataset(DATASET);
    let (app, _) = create_test_app(&dataset);

    let payload = json!({
        "id": 2101,
        "name": "Spinach",
        "type": "vegetable",
        "quantity": 5,
        "unit": "kg"
    });
    let (status, body) = post(&app, "/api/vegetable", payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "ok");

    let (_, body) = get(&app, "/api/vegetable?q=spin").await;
    assert_eq!(
        body,
        json!([{"id": 2101, "name": "Spinach", "type": "vegetable", "quantity": 5000, "unit": "g"}])
    );
}

#[tokio::test]
async fn test_readding_replaces_in_place() {
    let dataset = write_dataset(DATASET);
    let (app, _) = create_test_app(&dataset);

    let payload = json!({"id": 1, "name": "Wild Strawberries", "type": "fruit", "quantity": 250, "unit": "g"});
    let (status, _) = post(&app, "/api/fruit", payload).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = get(&app, "/api/fruit").await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], "Wild Strawberries");
    assert_eq!(rows[0]["quantity"], 250);
}

#[tokio::test]
async fn test_post_validation_errors() {
    let dataset = write_dataset(DATASET);
    let (app, _) = create_test_app(&dataset);

    let (status, body) = send_request(&app, "POST", "/api/fruit", Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON");

    let (status, body) = post(&app, "/api/fruit", json!([])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing key 'id'");

    let payload = json!({"id": 77701, "name": "TestFruit", "type": "fruit", "quantity": 10, "unit": "lb"});
    let (status, body) = post(&app, "/api/fruit", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid unit"));

    let (_, body) = get(&app, "/api/fruit").await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_post_routes_by_item_type() {
    let dataset = write_dataset(DATASET);
    let (app, _) = create_test_app(&dataset);

    let payload = json!({"id": 5, "name": "Leek", "type": "vegetable", "quantity": 1, "unit": "kg"});
    let (status, body) = post(&app, "/api/fruit", payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "ok");

    let (_, body) = get(&app, "/api/vegetable?q=leek").await;
    assert_eq!(
        body,
        json!([{"id": 5, "name": "Leek", "type": "vegetable", "quantity": 1000, "unit": "g"}])
    );

    let (_, body) = get(&app, "/api/fruit?q=leek").await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let dataset = write_dataset(DATASET);
    let (app, _) = create_test_app(&dataset);

    let (status, _) = send_request(&app, "DELETE", "/api/fruit/2", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send_request(&app, "DELETE", "/api/fruit/2", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = get(&app, "/api/fruit").await;
    let ids: Vec<_> = body.as_array().unwrap().iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(3)]);

    let (status, _) = send_request(&app, "DELETE", "/api/fruit/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bootstrap_runs_once() {
    let dataset = write_dataset(DATASET);
    let (app, state) = create_test_app(&dataset);

    let (status, _) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.importer.bootstrap_state(), LatchState::NotLoaded);

    get(&app, "/api/fruit").await;
    assert_eq!(state.importer.bootstrap_state(), LatchState::Loaded);

    // Removing an item must not be undone by a second import
    send_request(&app, "DELETE", "/api/fruit/1", None).await;
    let (_, body) = get(&app, "/api/fruit").await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unmatched_path_triggers_bootstrap() {
    let dataset = write_dataset(DATASET);
    let (app, state) = create_test_app(&dataset);

    let (status, body) = get(&app, "/no/such/page").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not found"}));
    assert_eq!(state.importer.bootstrap_state(), LatchState::Loaded);

    let (_, body) = get(&app, "/api/fruit").await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_concurrent_first_requests_import_once() {
    let dataset = write_dataset(DATASET);
    let (app, state) = create_test_app(&dataset);

    let requests = (0..16).map(|_| {
        let app = app.clone();
        tokio::spawn(async move { get(&app, "/api/fruit").await })
    });

    for handle in requests.collect::<Vec<_>>() {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
    }
    assert_eq!(state.importer.bootstrap_state(), LatchState::Loaded);
}

#[tokio::test]
async fn test_broken_dataset_fails_first_request_only() {
    let dataset = write_dataset("{ definitely not json");
    let (app, state) = create_test_app(&dataset);

    let (status, body) = get(&app, "/api/fruit").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON in"));
    assert_eq!(state.importer.bootstrap_state(), LatchState::Failed);

    let (status, body) = get(&app, "/api/fruit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
