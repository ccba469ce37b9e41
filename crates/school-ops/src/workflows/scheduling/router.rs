use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::class_schedules::ClassScheduleService;
use super::domain::{
    ClassScheduleChanges, ClassScheduleDraft, ClassScheduleFilter, NewScheduleSlot,
    ScheduleSlotFilter, ScheduleSlotUpdate,
};
use super::repository::{ClassScheduleRepository, ScheduleSlotRepository};
use super::slots::ScheduleSlotService;
use crate::error::ServiceError;
use crate::store::PageRequest;
use crate::workflows::calendar::DayOfWeek;
use crate::workflows::ids::{ClassId, ClassScheduleId, DormitoryId, SlotId, TeacherId};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SlotListQuery {
    dormitory_id: Option<DormitoryId>,
    active: Option<bool>,
    page: Option<i64>,
    page_size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScheduleListQuery {
    class_id: Option<ClassId>,
    teacher_id: Option<TeacherId>,
    dormitory_id: Option<DormitoryId>,
    day_of_week: Option<DayOfWeek>,
    page: Option<i64>,
    page_size: Option<i64>,
}

/// Router exposing slot and class schedule management.
pub fn scheduling_router<S, C>(
    slots: Arc<ScheduleSlotService<S>>,
    schedules: Arc<ClassScheduleService<C, S>>,
) -> Router
where
    S: ScheduleSlotRepository + 'static,
    C: ClassScheduleRepository + 'static,
{
    let slot_routes = Router::new()
        .route(
            "/api/v1/schedule-slots",
            get(list_slots::<S>).post(create_slot::<S>),
        )
        .route(
            "/api/v1/schedule-slots/:slot_id",
            get(get_slot::<S>)
                .patch(update_slot::<S>)
                .delete(delete_slot::<S>),
        )
        .with_state(slots);

    let schedule_routes = Router::new()
        .route(
            "/api/v1/class-schedules",
            get(list_schedules::<C, S>).post(create_schedule::<C, S>),
        )
        .route(
            "/api/v1/class-schedules/:schedule_id",
            get(get_schedule::<C, S>)
                .patch(update_schedule::<C, S>)
                .delete(delete_schedule::<C, S>),
        )
        .with_state(schedules);

    slot_routes.merge(schedule_routes)
}

pub(crate) async fn create_slot<S>(
    State(service): State<Arc<ScheduleSlotService<S>>>,
    Json(payload): Json<NewScheduleSlot>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: ScheduleSlotRepository + 'static,
{
    let slot = service.create(payload)?;
    Ok((StatusCode::CREATED, Json(slot)))
}

pub(crate) async fn list_slots<S>(
    State(service): State<Arc<ScheduleSlotService<S>>>,
    Query(query): Query<SlotListQuery>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: ScheduleSlotRepository + 'static,
{
    let filter = ScheduleSlotFilter {
        dormitory_id: query.dormitory_id,
        active: query.active,
    };
    let page = PageRequest {
        page: query.page,
        page_size: query.page_size,
    };
    Ok(Json(service.list(&filter, page)?))
}

pub(crate) async fn get_slot<S>(
    State(service): State<Arc<ScheduleSlotService<S>>>,
    Path(slot_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: ScheduleSlotRepository + 'static,
{
    let slot = service.get(SlotId::parse(&slot_id)?)?;
    Ok(Json(slot))
}

pub(crate) async fn update_slot<S>(
    State(service): State<Arc<ScheduleSlotService<S>>>,
    Path(slot_id): Path<String>,
    Json(payload): Json<ScheduleSlotUpdate>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: ScheduleSlotRepository + 'static,
{
    let slot = service.update(SlotId::parse(&slot_id)?, payload)?;
    Ok(Json(slot))
}

pub(crate) async fn delete_slot<S>(
    State(service): State<Arc<ScheduleSlotService<S>>>,
    Path(slot_id): Path<String>,
) -> Result<StatusCode, ServiceError>
where
    S: ScheduleSlotRepository + 'static,
{
    service.delete(SlotId::parse(&slot_id)?)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn create_schedule<C, S>(
    State(service): State<Arc<ClassScheduleService<C, S>>>,
    Json(payload): Json<ClassScheduleDraft>,
) -> Result<impl IntoResponse, ServiceError>
where
    C: ClassScheduleRepository + 'static,
    S: ScheduleSlotRepository + 'static,
{
    let schedule = service.create(payload)?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub(crate) async fn list_schedules<C, S>(
    State(service): State<Arc<ClassScheduleService<C, S>>>,
    Query(query): Query<ScheduleListQuery>,
) -> Result<impl IntoResponse, ServiceError>
where
    C: ClassScheduleRepository + 'static,
    S: ScheduleSlotRepository + 'static,
{
    let filter = ClassScheduleFilter {
        class_id: query.class_id,
        teacher_id: query.teacher_id,
        dormitory_id: query.dormitory_id,
        day_of_week: query.day_of_week,
    };
    let page = PageRequest {
        page: query.page,
        page_size: query.page_size,
    };
    Ok(Json(service.list(&filter, page)?))
}

pub(crate) async fn get_schedule<C, S>(
    State(service): State<Arc<ClassScheduleService<C, S>>>,
    Path(schedule_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError>
where
    C: ClassScheduleRepository + 'static,
    S: ScheduleSlotRepository + 'static,
{
    let schedule = service.get(ClassScheduleId::parse(&schedule_id)?)?;
    Ok(Json(schedule))
}

pub(crate) async fn update_schedule<C, S>(
    State(service): State<Arc<ClassScheduleService<C, S>>>,
    Path(schedule_id): Path<String>,
    Json(payload): Json<ClassScheduleChanges>,
) -> Result<impl IntoResponse, ServiceError>
where
    C: ClassScheduleRepository + 'static,
    S: ScheduleSlotRepository + 'static,
{
    let schedule = service.update(ClassScheduleId::parse(&schedule_id)?, payload)?;
    Ok(Json(schedule))
}

pub(crate) async fn delete_schedule<C, S>(
    State(service): State<Arc<ClassScheduleService<C, S>>>,
    Path(schedule_id): Path<String>,
) -> Result<StatusCode, ServiceError>
where
    C: ClassScheduleRepository + 'static,
    S: ScheduleSlotRepository + 'static,
{
    service.delete(ClassScheduleId::parse(&schedule_id)?)?;
    Ok(StatusCode::NO_CONTENT)
}
