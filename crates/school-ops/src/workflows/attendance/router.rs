use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{
    LockSessionsRequest, OpenSessionsRequest, SessionFilter, StudentSubmission, TeacherSubmission,
};
use super::repository::{AttendanceRecordRepository, AttendanceSessionRepository};
use super::service::AttendanceService;
use crate::error::ServiceError;
use crate::store::PageRequest;
use crate::workflows::calendar::parse_date;
use crate::workflows::ids::{parse_optional, ClassScheduleId, SessionId, TeacherId};
use crate::workflows::scheduling::ClassScheduleRepository;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SessionListQuery {
    class_schedule_id: Option<String>,
    teacher_id: Option<String>,
    date: Option<String>,
    status: Option<String>,
    page: Option<i64>,
    page_size: Option<i64>,
}

type Service<S, R, C> = Arc<AttendanceService<S, R, C>>;

/// Router exposing the attendance session lifecycle.
pub fn attendance_router<S, R, C>(service: Service<S, R, C>) -> Router
where
    S: AttendanceSessionRepository + 'static,
    R: AttendanceRecordRepository + 'static,
    C: ClassScheduleRepository + 'static,
{
    Router::new()
        .route("/api/v1/attendance/sessions", get(list_handler::<S, R, C>))
        .route(
            "/api/v1/attendance/sessions/open",
            post(open_handler::<S, R, C>),
        )
        .route(
            "/api/v1/attendance/sessions/lock",
            post(lock_handler::<S, R, C>),
        )
        .route(
            "/api/v1/attendance/sessions/:session_id",
            get(get_handler::<S, R, C>),
        )
        .route(
            "/api/v1/attendance/sessions/:session_id/students",
            put(students_handler::<S, R, C>),
        )
        .route(
            "/api/v1/attendance/sessions/:session_id/teacher",
            put(teacher_handler::<S, R, C>),
        )
        .with_state(service)
}

pub(crate) async fn open_handler<S, R, C>(
    State(service): State<Service<S, R, C>>,
    Json(request): Json<OpenSessionsRequest>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: AttendanceSessionRepository + 'static,
    R: AttendanceRecordRepository + 'static,
    C: ClassScheduleRepository + 'static,
{
    let outcome = service.open_sessions(request)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub(crate) async fn lock_handler<S, R, C>(
    State(service): State<Service<S, R, C>>,
    Json(request): Json<LockSessionsRequest>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: AttendanceSessionRepository + 'static,
    R: AttendanceRecordRepository + 'static,
    C: ClassScheduleRepository + 'static,
{
    Ok(Json(service.lock_sessions_for_date(&request.date)?))
}

pub(crate) async fn list_handler<S, R, C>(
    State(service): State<Service<S, R, C>>,
    Query(query): Query<SessionListQuery>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: AttendanceSessionRepository + 'static,
    R: AttendanceRecordRepository + 'static,
    C: ClassScheduleRepository + 'static,
{
    let filter = SessionFilter {
        class_schedule_id: parse_optional(
            query.class_schedule_id.as_deref(),
            ClassScheduleId::parse,
        )?,
        teacher_id: parse_optional(query.teacher_id.as_deref(), TeacherId::parse)?,
        date: parse_optional(query.date.as_deref(), parse_date)?,
        status: parse_optional(query.status.as_deref(), |raw| raw.parse())?,
    };
    let page = PageRequest {
        page: query.page,
        page_size: query.page_size,
    };
    Ok(Json(service.list(&filter, page)?))
}

pub(crate) async fn get_handler<S, R, C>(
    State(service): State<Service<S, R, C>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: AttendanceSessionRepository + 'static,
    R: AttendanceRecordRepository + 'static,
    C: ClassScheduleRepository + 'static,
{
    Ok(Json(service.get(SessionId::parse(&session_id)?)?))
}

pub(crate) async fn students_handler<S, R, C>(
    State(service): State<Service<S, R, C>>,
    Path(session_id): Path<String>,
    Json(submission): Json<StudentSubmission>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: AttendanceSessionRepository + 'static,
    R: AttendanceRecordRepository + 'static,
    C: ClassScheduleRepository + 'static,
{
    let saved = service.submit_students(SessionId::parse(&session_id)?, submission)?;
    Ok(Json(saved))
}

pub(crate) async fn teacher_handler<S, R, C>(
    State(service): State<Service<S, R, C>>,
    Path(session_id): Path<String>,
    Json(submission): Json<TeacherSubmission>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: AttendanceSessionRepository + 'static,
    R: AttendanceRecordRepository + 'static,
    C: ClassScheduleRepository + 'static,
{
    let saved = service.submit_teacher(SessionId::parse(&session_id)?, submission)?;
    Ok(Json(saved))
}
