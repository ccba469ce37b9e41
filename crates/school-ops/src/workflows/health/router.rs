use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{HealthStatusChanges, HealthStatusFilter, HealthStatusRequest};
use super::repository::HealthStatusRepository;
use super::service::HealthStatusService;
use crate::error::ServiceError;
use crate::store::PageRequest;
use crate::workflows::ids::{parse_optional, HealthStatusId, StudentId, UserId};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HealthListQuery {
    student_id: Option<String>,
    status: Option<String>,
    page: Option<i64>,
    page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevokePayload {
    revoked_by: String,
}

/// Router exposing medical exemption records.
pub fn health_router<H>(service: Arc<HealthStatusService<H>>) -> Router
where
    H: HealthStatusRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/health-statuses",
            get(list_handler::<H>).post(create_handler::<H>),
        )
        .route(
            "/api/v1/health-statuses/:health_id",
            get(get_handler::<H>).patch(update_handler::<H>),
        )
        .route(
            "/api/v1/health-statuses/:health_id/revoke",
            post(revoke_handler::<H>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<H>(
    State(service): State<Arc<HealthStatusService<H>>>,
    Json(request): Json<HealthStatusRequest>,
) -> Result<impl IntoResponse, ServiceError>
where
    H: HealthStatusRepository + 'static,
{
    let record = service.create(request)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub(crate) async fn list_handler<H>(
    State(service): State<Arc<HealthStatusService<H>>>,
    Query(query): Query<HealthListQuery>,
) -> Result<impl IntoResponse, ServiceError>
where
    H: HealthStatusRepository + 'static,
{
    let filter = HealthStatusFilter {
        student_id: parse_optional(query.student_id.as_deref(), StudentId::parse)?,
        status: parse_optional(query.status.as_deref(), |raw| raw.parse())?,
    };
    let page = PageRequest {
        page: query.page,
        page_size: query.page_size,
    };
    Ok(Json(service.list(&filter, page)?))
}

pub(crate) async fn get_handler<H>(
    State(service): State<Arc<HealthStatusService<H>>>,
    Path(health_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError>
where
    H: HealthStatusRepository + 'static,
{
    Ok(Json(service.get(HealthStatusId::parse(&health_id)?)?))
}

pub(crate) async fn update_handler<H>(
    State(service): State<Arc<HealthStatusService<H>>>,
    Path(health_id): Path<String>,
    Json(changes): Json<HealthStatusChanges>,
) -> Result<impl IntoResponse, ServiceError>
where
    H: HealthStatusRepository + 'static,
{
    let record = service.update(HealthStatusId::parse(&health_id)?, changes)?;
    Ok(Json(record))
}

pub(crate) async fn revoke_handler<H>(
    State(service): State<Arc<HealthStatusService<H>>>,
    Path(health_id): Path<String>,
    Json(payload): Json<RevokePayload>,
) -> Result<impl IntoResponse, ServiceError>
where
    H: HealthStatusRepository + 'static,
{
    let record = service.revoke(
        HealthStatusId::parse(&health_id)?,
        UserId::parse(&payload.revoked_by)?,
    )?;
    Ok(Json(record))
}
