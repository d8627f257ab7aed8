//! End-to-end requests through the router into a real skill backed by a
//! recording transport.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use skill_gateway::routes::create_router;
use skill_vendors::{linear::LinearSkill, RecordingTransport, VendorTransport};
use tower::ServiceExt;

fn linear(stub: &Arc<RecordingTransport>) -> Router {
    let transport: Arc<dyn VendorTransport> = stub.clone();
    create_router(Arc::new(LinearSkill::new(transport)))
}

fn action(body: &Value) -> Request<Body> {
    match Request::builder()
        .method("POST")
        .uri("/action")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
    {
        Ok(r) => r,
        Err(e) => panic!("failed to build request: {e}"),
    }
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = match app.oneshot(req).await {
        Ok(r) => r,
        Err(e) => panic!("handler error: {e}"),
    };
    let status = resp.status();
    let bytes = match axum::body::to_bytes(resp.into_body(), 64 * 1024).await {
        Ok(b) => b,
        Err(e) => panic!("failed to read body: {e}"),
    };
    match serde_json::from_slice(&bytes) {
        Ok(v) => (status, v),
        Err(e) => panic!("invalid JSON: {e}"),
    }
}

#[tokio::test]
async fn teams_list_returns_flat_records_in_a_success_envelope() {
    let stub = Arc::new(RecordingTransport::new().reply(json!({
        "data": {"teams": {"nodes": [
            {"id": "t1", "key": "ENG", "name": "Engineering", "description": null},
            {"id": "t2", "key": "OPS", "name": "Operations", "description": "On-call"}
        ]}}
    })));
    let (status, body) = send(linear(&stub), action(&json!({"category": "teams", "action": "list", "params": {}}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "data": [
            {"id": "t1", "key": "ENG", "name": "Engineering", "description": null},
            {"id": "t2", "key": "OPS", "name": "Operations", "description": "On-call"}
        ]})
    );
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn unknown_category_never_reaches_the_vendor() {
    let stub = Arc::new(RecordingTransport::new());
    let (status, body) = send(linear(&stub), action(&json!({"category": "widgets", "action": "list"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let message = body["error"].as_str().unwrap_or_default();
    assert!(message.starts_with("Unknown category: widgets"), "got {message}");
    assert!(message.contains("issues"), "got {message}");
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn invalid_identifiers_are_rejected_locally() {
    let stub = Arc::new(RecordingTransport::new());
    let req = action(&json!({"category": "issues", "action": "get", "params": {"id": "not an id"}}));
    let (status, body) = send(linear(&stub), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("id"));
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn vendor_failures_are_sanitized() {
    let stub = Arc::new(RecordingTransport::new().fail(skill_core::VendorError::Api {
        status: Some(401),
        code: None,
        message: "invalid key lin_api_0123456789abcdef for Bearer abc.def".to_owned(),
    }));
    let (status, body) = send(linear(&stub), action(&json!({"category": "users", "action": "me"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let message = body["error"].as_str().unwrap_or_default();
    assert!(!message.contains("lin_api_"), "leaked key: {message}");
    assert!(!message.contains("abc.def"), "leaked token: {message}");
}

#[tokio::test]
async fn client_supplied_tokens_are_redacted_from_echoed_errors() {
    let stub = Arc::new(RecordingTransport::new());
    let req = action(&json!({"category": "Bearer sk-live-123456", "action": "list"}));
    let (status, body) = send(linear(&stub), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap_or_default();
    assert!(!message.contains("sk-live-123456"), "got {message}");
    assert!(message.contains("[REDACTED]"), "got {message}");
}

#[tokio::test]
async fn health_is_idempotent_and_offline() {
    let stub = Arc::new(RecordingTransport::new());
    let app = linear(&stub);
    for _ in 0..2 {
        let req = match Request::builder().uri("/health").body(Body::empty()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let (status, body) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "skill": "linear"}));
    }
    assert_eq!(stub.calls(), 0);
}
