use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{LeavePermitFilter, LeavePermitRequest};
use super::repository::LeavePermitRepository;
use super::service::LeavePermitService;
use crate::error::ServiceError;
use crate::store::PageRequest;
use crate::workflows::ids::{parse_optional, LeavePermitId, StudentId, UserId};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PermitListQuery {
    student_id: Option<String>,
    status: Option<String>,
    leave_type: Option<String>,
    page: Option<i64>,
    page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionPayload {
    approved_by: String,
}

/// Router exposing leave permit intake and the approval workflow.
pub fn leave_router<L>(service: Arc<LeavePermitService<L>>) -> Router
where
    L: LeavePermitRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/leave-permits",
            get(list_handler::<L>).post(create_handler::<L>),
        )
        .route("/api/v1/leave-permits/:permit_id", get(get_handler::<L>))
        .route(
            "/api/v1/leave-permits/:permit_id/approve",
            post(approve_handler::<L>),
        )
        .route(
            "/api/v1/leave-permits/:permit_id/reject",
            post(reject_handler::<L>),
        )
        .route(
            "/api/v1/leave-permits/:permit_id/complete",
            post(complete_handler::<L>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<L>(
    State(service): State<Arc<LeavePermitService<L>>>,
    Json(request): Json<LeavePermitRequest>,
) -> Result<impl IntoResponse, ServiceError>
where
    L: LeavePermitRepository + 'static,
{
    let permit = service.create(request)?;
    Ok((StatusCode::CREATED, Json(permit)))
}

pub(crate) async fn list_handler<L>(
    State(service): State<Arc<LeavePermitService<L>>>,
    Query(query): Query<PermitListQuery>,
) -> Result<impl IntoResponse, ServiceError>
where
    L: LeavePermitRepository + 'static,
{
    let filter = LeavePermitFilter {
        student_id: parse_optional(query.student_id.as_deref(), StudentId::parse)?,
        status: parse_optional(query.status.as_deref(), |raw| raw.parse())?,
        leave_type: parse_optional(query.leave_type.as_deref(), |raw| raw.parse())?,
    };
    let page = PageRequest {
        page: query.page,
        page_size: query.page_size,
    };
    Ok(Json(service.list(&filter, page)?))
}

pub(crate) async fn get_handler<L>(
    State(service): State<Arc<LeavePermitService<L>>>,
    Path(permit_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError>
where
    L: LeavePermitRepository + 'static,
{
    let permit = service.get(LeavePermitId::parse(&permit_id)?)?;
    Ok(Json(permit))
}

pub(crate) async fn approve_handler<L>(
    State(service): State<Arc<LeavePermitService<L>>>,
    Path(permit_id): Path<String>,
    Json(payload): Json<DecisionPayload>,
) -> Result<impl IntoResponse, ServiceError>
where
    L: LeavePermitRepository + 'static,
{
    let permit = service.approve(
        LeavePermitId::parse(&permit_id)?,
        UserId::parse(&payload.approved_by)?,
    )?;
    Ok(Json(permit))
}

pub(crate) async fn reject_handler<L>(
    State(service): State<Arc<LeavePermitService<L>>>,
    Path(permit_id): Path<String>,
    Json(payload): Json<DecisionPayload>,
) -> Result<impl IntoResponse, ServiceError>
where
    L: LeavePermitRepository + 'static,
{
    let permit = service.reject(
        LeavePermitId::parse(&permit_id)?,
        UserId::parse(&payload.approved_by)?,
    )?;
    Ok(Json(permit))
}

pub(crate) async fn complete_handler<L>(
    State(service): State<Arc<LeavePermitService<L>>>,
    Path(permit_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError>
where
    L: LeavePermitRepository + 'static,
{
    let permit = service.complete(LeavePermitId::parse(&permit_id)?)?;
    Ok(Json(permit))
}
