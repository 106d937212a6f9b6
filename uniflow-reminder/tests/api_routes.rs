use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uniflow_core::time::FixedClock;
use uniflow_reminder::{router, AppState, LogNotifier, ReminderScheduler};

fn app() -> (Router, ReminderScheduler) {
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
    let scheduler = ReminderScheduler::new(Arc::new(FixedClock(now)), Arc::new(LogNotifier));
    (router(AppState::new(scheduler.clone())), scheduler)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn json_of(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn schedule_future_reminder_returns_created() {
    let (app, scheduler) = app();
    let (status, body) = send(
        &app,
        post_json(
            "/api/schedule",
            &json!({"taskId": "t1", "message": "Reminder: lab", "time": "2026-03-02T09:00:00.000Z"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json_of(&body)["message"], "Notification scheduled successfully");
    assert_eq!(scheduler.pending_count(), 1);
}

#[tokio::test]
async fn schedule_in_the_past_is_ok_but_not_registered() {
    let (app, scheduler) = app();
    let (status, body) = send(
        &app,
        post_json(
            "/api/schedule",
            &json!({"taskId": "t1", "message": "late", "time": "2026-03-01T09:00:00Z"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_of(&body)["message"],
        "Notification time is in the past, not scheduled."
    );
    assert_eq!(scheduler.pending_count(), 0);
}

#[tokio::test]
async fn schedule_rejects_missing_fields_and_bad_times() {
    let (app, scheduler) = app();

    let (status, body) = send(
        &app,
        post_json("/api/schedule", &json!({"taskId": "t1", "time": "2026-03-02T09:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["error"], "Missing required fields");

    let (status, _) = send(
        &app,
        post_json(
            "/api/schedule",
            &json!({"taskId": "  ", "message": "m", "time": "2026-03-02T09:00:00Z"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        post_json(
            "/api/schedule",
            &json!({"taskId": "t1", "message": "m", "time": "next tuesday"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["error"], "Invalid time format");

    let malformed = Request::builder()
        .method("POST")
        .uri("/api/schedule")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(scheduler.pending_count(), 0);
}

#[tokio::test]
async fn cancel_reports_both_outcomes_with_200() {
    let (app, scheduler) = app();
    send(
        &app,
        post_json(
            "/api/schedule",
            &json!({"taskId": "t1", "message": "m", "time": "2026-03-02T09:00:00Z"}),
        ),
    )
    .await;

    let (status, body) = send(&app, post_json("/api/cancel", &json!({"taskId": "t1"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["message"], "Notification cancelled successfully");
    assert_eq!(scheduler.pending_count(), 0);

    let (status, body) = send(&app, post_json("/api/cancel", &json!({"taskId": "t1"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["message"], "No active notification found to cancel");
}

#[tokio::test]
async fn cancel_without_task_id_is_bad_request() {
    let (app, _) = app();
    let (status, body) = send(&app, post_json("/api/cancel", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["error"], "Missing taskId");
}

#[tokio::test]
async fn liveness_and_health_report_pending_jobs() {
    let (app, scheduler) = app();
    scheduler
        .schedule_at_str("t1", "m", "2026-03-02T10:00:00Z")
        .unwrap();

    let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "UniFlow Notification Server is running. Active jobs: 1"
    );

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let health = json_of(&body);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["pending_jobs"], 1);
    assert_eq!(health["fired_total"], 0);
}
