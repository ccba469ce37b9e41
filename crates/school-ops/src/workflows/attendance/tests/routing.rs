use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::store::MemoryStore;
use crate::workflows::attendance::{attendance_router, router, StudentSubmission};
use crate::workflows::ids::{SessionId, StudentId};

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn open_route_is_idempotent() {
    let h = harness();
    let schedule = h.schedule();
    let app = attendance_router(h.attendance.clone());
    let payload = json!({
        "date": "2025-11-01",
        "class_schedule_ids": [schedule.id]
    });

    let first = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/attendance/sessions/open",
            payload.clone(),
        ))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::CREATED);
    let body = read_json_body(first).await;
    assert_eq!(body["created"].as_array().map(Vec::len), Some(1));

    let second = app
        .oneshot(json_request(
            "POST",
            "/api/v1/attendance/sessions/open",
            payload,
        ))
        .await
        .expect("response");
    let body = read_json_body(second).await;
    assert_eq!(body["created"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["skipped"][0], json!(schedule.id));
}

#[tokio::test]
async fn locked_session_returns_conflict() {
    let h = harness();
    let schedule = h.schedule();
    let session = h.open(&schedule, "2025-11-01");
    let app = attendance_router(h.attendance.clone());

    let locked = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/attendance/sessions/lock",
            json!({ "date": "2025-11-01" }),
        ))
        .await
        .expect("response");
    assert_eq!(locked.status(), StatusCode::OK);
    assert_eq!(read_json_body(locked).await["locked"], 1);

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/attendance/sessions/{session}/students"),
            json!({ "records": [{ "student_id": StudentId::new(), "status": "present" }] }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn session_detail_includes_records() {
    let h = harness();
    let schedule = h.schedule();
    let session = h.open(&schedule, "2025-11-01");
    let student = StudentId::new();
    h.approved_permit(student, "2025-11-01", "2025-11-01");
    let app = attendance_router(h.attendance.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/attendance/sessions/{session}/students"),
            json!({ "records": [{ "student_id": student, "status": "present" }] }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::get(format!("/api/v1/attendance/sessions/{session}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "open");
    assert_eq!(body["students"][0]["status"], "permit");
}

#[tokio::test]
async fn list_route_rejects_bad_filters() {
    let h = harness();
    let app = attendance_router(h.attendance.clone());

    let response = app
        .oneshot(
            Request::get("/api/v1/attendance/sessions?date=yesterday")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn students_handler_maps_missing_session_to_not_found() {
    let h = harness();

    let response = router::students_handler::<MemoryStore, MemoryStore, MemoryStore>(
        State(h.attendance.clone()),
        Path(SessionId::new().to_string()),
        Json(submission(vec![entry(StudentId::new(), "present")])),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn students_handler_rejects_empty_batch() {
    let h = harness();
    let schedule = h.schedule();
    let session = h.open(&schedule, "2025-11-01");

    let response = router::students_handler::<MemoryStore, MemoryStore, MemoryStore>(
        State(h.attendance.clone()),
        Path(session.to_string()),
        Json(StudentSubmission::default()),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
