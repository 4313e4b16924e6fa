//! HTTP contract tests for the content API

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use content_ledger::config::LedgerConfig;
use content_ledger::web::content_router;
use content_ledger::ContentStore;

fn create_test_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = LedgerConfig::new(temp_dir.path().join("content.json"), "web-test-secret");
    let store = ContentStore::open_from_config(&config).expect("Failed to open store");
    (content_router(Arc::new(store)), temp_dir)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
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
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn crud_lifecycle_follows_the_contract() {
    let (app, _dir) = create_test_app();

    let (status, created) =
        send(&app, "POST", "/content", Some(json!({"title": "A", "type": "doc"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], json!(1));
    assert_eq!(created["payload"]["temporal"]["version"], json!(1));

    let (status, fetched) = send(&app, "GET", "/content/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = send(&app, "PUT", "/content/1", Some(json!({"title": "B"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["payload"]["title"], json!("B"));
    assert_eq!(updated["payload"]["type"], json!("doc"));
    assert_eq!(updated["verification"]["trust_chain"].as_array().unwrap().len(), 2);

    let (status, listed) = send(&app, "GET", "/content", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, verdict) = send(&app, "GET", "/content/1/verify", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict, json!({"valid": true}));

    let (status, body) = send(&app, "DELETE", "/content/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, "DELETE", "/content/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_records_are_404_with_error_body() {
    let (app, _dir) = create_test_app();

    for (method, uri, body) in [
        ("GET", "/content/999", None),
        ("PUT", "/content/999", Some(json!({"title": "x"}))),
        ("DELETE", "/content/999", None),
        ("GET", "/content/999/verify", None),
        ("GET", "/content/999/audit", None),
    ] {
        let (status, body) = send(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert!(body["error"].as_str().unwrap().contains("999"));
    }
}

#[tokio::test]
async fn malformed_payload_is_a_client_error() {
    let (app, _dir) = create_test_app();

    let (status, body) = send(&app, "POST", "/content", Some(json!({"usage": "everywhere"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, listed) = send(&app, "GET", "/content", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));
}

async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).expect("error responses carry a JSON body");
    (status, value)
}

#[tokio::test]
async fn unparseable_bodies_get_json_errors() {
    let (app, _dir) = create_test_app();

    for (method, uri, content_type, body) in [
        ("POST", "/content", Some("application/json"), "{not json"),
        ("POST", "/content", None, r#"{"title": "A"}"#),
        ("POST", "/content", Some("text/plain"), r#"{"title": "A"}"#),
        ("PUT", "/content/1", Some("application/json"), "[1, 2"),
        ("PUT", "/content/1/status", Some("application/json"), r#"{"status": "maybe"}"#),
    ] {
        let (status, body) = send_raw(&app, method, uri, content_type, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri} {content_type:?}");
        assert!(body["error"].is_string(), "{method} {uri}: {body}");
    }

    let (_, listed) = send(&app, "GET", "/content", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn status_and_audit_routes() {
    let (app, _dir) = create_test_app();
    send(&app, "POST", "/content", Some(json!({"title": "A"}))).await;

    let (status, record) =
        send(&app, "PUT", "/content/1/status", Some(json!({"status": "verified"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["verification"]["status"], json!("verified"));

    let (status, audit) = send(&app, "GET", "/content/1/audit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit["links"], json!(1));
    assert_eq!(audit["findings"], json!([]));

    let (status, health) = send(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health, json!({"status": "ok", "records": 1}));
}
