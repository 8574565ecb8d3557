use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use ridehail_api::{create_dispatch_app, ApiOptions};
use ridehail_core::CallAuditor;
use ridehail_dispatcher::{FirstAvailableStrategy, RideDispatcher};

fn app_with(options: ApiOptions) -> Router {
    let dispatcher = RideDispatcher::with_strategy(
        Duration::from_secs(10),
        Arc::new(FirstAvailableStrategy),
    );
    create_dispatch_app(Arc::new(dispatcher), options)
}

fn app() -> Router {
    app_with(ApiOptions::default())
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
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, driver_id: &str) {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/drivers",
        Some(json!({"driver_id": driver_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "driver_registered");
}

async fn request_ride(app: &Router) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/rides",
        Some(json!({
            "rider_id": "rider-1",
            "pickup_location": "Airport",
            "destination": "Old Town"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ride_lifecycle_over_http() {
    let app = app();
    register(&app, "d1").await;
    register(&app, "d2").await;

    let ride = request_ride(&app).await;
    assert_eq!(ride["status"], "assigned");
    assert_eq!(ride["assigned_driver"], "d1");
    let ride_id = ride["ride_id"].as_str().unwrap().to_string();

    let (_, offered) = send(&app, "GET", "/api/v1/drivers/d1/assigned-ride", None).await;
    assert_eq!(offered["ride_id"], ride_id.as_str());
    assert_eq!(offered["pickup_location"], "Airport");
    assert_eq!(offered["destination"], "Old Town");

    let (_, status) = send(&app, "GET", &format!("/api/v1/rides/{ride_id}/status"), None).await;
    assert_eq!(status["status"], "waiting_for_acceptance");

    // 非指派司机接单
    let (code, body) = send(
        &app,
        "POST",
        &format!("/api/v1/rides/{ride_id}/accept"),
        Some(json!({"driver_id": "d2"})),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "ride_already_accepted");

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/v1/rides/{ride_id}/accept"),
        Some(json!({"driver_id": "d1"})),
    )
    .await;
    assert_eq!(body["status"], "ride_accepted");
    assert_eq!(body["ride_id"], ride_id.as_str());

    let (_, status) = send(&app, "GET", &format!("/api/v1/rides/{ride_id}/status"), None).await;
    assert_eq!(status["status"], "in_progress");

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/v1/rides/{ride_id}/complete"),
        Some(json!({"driver_id": "d2"})),
    )
    .await;
    assert_eq!(body["status"], "ride_not_found");

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/v1/rides/{ride_id}/complete"),
        Some(json!({"driver_id": "d1"})),
    )
    .await;
    assert_eq!(body["status"], "ride_completed");

    let (_, status) = send(&app, "GET", &format!("/api/v1/rides/{ride_id}/status"), None).await;
    assert_eq!(status["status"], "completed");
}

#[tokio::test]
async fn test_reject_over_http() {
    let app = app();
    register(&app, "d1").await;
    register(&app, "d2").await;

    let ride = request_ride(&app).await;
    let ride_id = ride["ride_id"].as_str().unwrap().to_string();

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/v1/rides/{ride_id}/reject"),
        Some(json!({"driver_id": "d1"})),
    )
    .await;
    assert_eq!(body["status"], "ride_rejected");

    let (_, offered) = send(&app, "GET", "/api/v1/drivers/d2/assigned-ride", None).await;
    assert_eq!(offered["ride_id"], ride_id.as_str());

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/v1/rides/{ride_id}/reject"),
        Some(json!({"driver_id": "d1"})),
    )
    .await;
    assert_eq!(body["status"], "no_such_ride");

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/v1/rides/{ride_id}/reject"),
        Some(json!({"driver_id": "d2"})),
    )
    .await;
    assert_eq!(body["status"], "ride_rejected");

    let (_, status) = send(&app, "GET", &format!("/api/v1/rides/{ride_id}/status"), None).await;
    assert_eq!(status["status"], "cancelled");
}

#[tokio::test]
async fn test_no_drivers_and_unknown_ride() {
    let app = app();

    let ride = request_ride(&app).await;
    assert_eq!(ride["status"], "no_drivers_available");

    let (_, status) = send(&app, "GET", "/api/v1/rides/missing/status", None).await;
    assert_eq!(status["status"], "no_such_ride");

    let (_, offered) = send(&app, "GET", "/api/v1/drivers/ghost/assigned-ride", None).await;
    assert_eq!(offered, json!({"ride_id": "", "pickup_location": "", "destination": ""}));
}

#[tokio::test]
async fn test_unregister_driver() {
    let app = app();
    register(&app, "d1").await;

    let (status, body) = send(&app, "DELETE", "/api/v1/drivers/d1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "driver_unregistered");

    // 注销未注册的司机同样成功
    let (status, _) = send(&app, "DELETE", "/api/v1/drivers/d1", None).await;
    assert_eq!(status, StatusCode::OK);

    let ride = request_ride(&app).await;
    assert_eq!(ride["status"], "no_drivers_available");
}

#[tokio::test]
async fn test_empty_ids_are_bad_requests() {
    let app = app();

    let (status, body) = send(&app, "POST", "/api/v1/drivers", Some(json!({"driver_id": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "BAD_REQUEST");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/rides/r1/accept",
        Some(json!({"driver_id": " "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[derive(Default)]
struct RecordingAuditor {
    entries: Mutex<Vec<String>>,
}

#[async_trait]
impl CallAuditor for RecordingAuditor {
    async fn before_call(&self, role: &str, method: &str, request: &str) {
        self.entries
            .lock()
            .unwrap()
            .push(format!("before {role} {method} {request}"));
    }

    async fn after_call(&self, role: &str, method: &str, response: &str) {
        self.entries
            .lock()
            .unwrap()
            .push(format!("after {role} {method} {response}"));
    }
}

#[tokio::test]
async fn test_audit_hook_observes_calls() {
    let auditor = Arc::new(RecordingAuditor::default());
    let app = app_with(ApiOptions {
        auditor: Some(auditor.clone()),
        ..ApiOptions::default()
    });

    register(&app, "d1").await;
    send(&app, "GET", "/health", None).await;

    let entries = auditor.entries.lock().unwrap().clone();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], r#"before server RegisterDriver {"driver_id":"d1"}"#);
    assert_eq!(
        entries[1],
        r#"after server RegisterDriver {"status":"driver_registered"}"#
    );
}
