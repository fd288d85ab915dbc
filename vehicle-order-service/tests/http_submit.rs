mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use support::{pipeline, RecordingAudit, RecordingPublisher};
use tokio::sync::Notify;
use tower::ServiceExt; // for oneshot
use vehicle_order_service::pipeline::SUCCESS_MESSAGE;
use vehicle_order_service::{build_router, AppState};

fn app(publisher: RecordingPublisher) -> (axum::Router, Arc<RecordingPublisher>) {
    let publisher = Arc::new(publisher);
    let state = AppState { pipeline: Arc::new(pipeline(publisher.clone(), Arc::new(RecordingAudit::new()))) };
    (build_router(state), publisher)
}

fn post_order(body: Value) -> Request<Body> {
    Request::builder()
        .uri("/orders")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn accepted_order_returns_202_with_order_id() {
    let (app, publisher) = app(RecordingPublisher::new());
    let body = json!({
        "customerName": "Jane Doe",
        "email": "jane@x.com",
        "model": "SUV",
        "color": "Blue",
        "features": ["Sunroof", "Heated Seats"]
    });
    let resp = app.oneshot(post_order(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body = json_body(resp).await;
    assert_eq!(body["status"], SUCCESS_MESSAGE);
    let calls = publisher.calls();
    assert_eq!(body["orderId"], calls[0].key.as_str());
    assert_eq!(calls[0].record.features, vec!["Sunroof".to_string(), "Heated Seats".to_string()]);
}

#[tokio::test]
async fn missing_fields_return_400() {
    let (app, publisher) = app(RecordingPublisher::new());
    let resp = app.oneshot(post_order(json!({"customerName": "Jane Doe", "model": "SUV", "color": "Blue"}))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "validation_failed");
    let body = json_body(resp).await;
    assert_eq!(body["message"], "Error: Please fill in all required fields");
    assert!(publisher.calls().is_empty());
}

#[tokio::test]
async fn broker_failure_returns_502() {
    let (app, _) = app(RecordingPublisher::failing("broker unreachable"));
    let resp = app.oneshot(post_order(json!({"customerName": "Jane Doe", "email": "jane@x.com", "model": "SUV", "color": "Blue"}))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "publish_failed");
    assert_eq!(json_body(resp).await["message"], "Error: broker unreachable");
}

#[tokio::test]
async fn concurrent_submit_returns_409() {
    let gate = Arc::new(Notify::new());
    let (app, publisher) = app(RecordingPublisher::gated(gate.clone()));
    let order = json!({"customerName": "Jane Doe", "email": "jane@x.com", "model": "SUV", "color": "Blue"});

    let first = tokio::spawn(app.clone().oneshot(post_order(order.clone())));
    tokio::time::timeout(Duration::from_secs(5), async {
        while publisher.calls().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("first request reached the publisher");

    let resp = app.oneshot(post_order(order)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "submission_in_flight");
    assert_eq!(json_body(resp).await["message"], "Error: An order submission is already in progress");

    gate.notify_one();
    let resp = first.await.expect("join").unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(publisher.calls().len(), 1);
}

#[tokio::test]
async fn catalog_and_metrics_are_served() {
    let (app, _) = app(RecordingPublisher::new());
    let resp = app.clone().oneshot(Request::builder().uri("/catalog").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let catalog = json_body(resp).await;
    assert_eq!(catalog["models"], json!(["Sedan", "SUV", "Truck", "Hatchback", "Convertible"]));
    assert_eq!(catalog["wheels"].as_array().unwrap().len(), 4);

    let resp = app.oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("vehicle_order_submission_duration_seconds"));
}
