use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveTime;
use serde_json::Value;

use crate::audit::MemoryAuditSink;
use crate::store::{MemoryStore, Page, Pagination, RepositoryError};
use crate::workflows::ids::{DormitoryId, SlotId};
use crate::workflows::scheduling::{
    ClassScheduleDraft, ClassScheduleService, NewScheduleSlot, ScheduleSlot, ScheduleSlotFilter,
    ScheduleSlotRepository, ScheduleSlotService,
};

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub(super) fn new_slot(
    dormitory_id: DormitoryId,
    slot_number: u32,
    start: NaiveTime,
    end: NaiveTime,
) -> NewScheduleSlot {
    NewScheduleSlot {
        dormitory_id,
        slot_number,
        name: format!("Period {slot_number}"),
        start_time: start,
        end_time: end,
        active: true,
    }
}

pub(super) fn draft(dormitory_id: DormitoryId) -> ClassScheduleDraft {
    ClassScheduleDraft {
        class_id: crate::workflows::ids::ClassId::new().to_string(),
        teacher_id: crate::workflows::ids::TeacherId::new().to_string(),
        dormitory_id: dormitory_id.to_string(),
        subject_id: None,
        day_of_week: "Monday".to_string(),
        slot_id: None,
        start_time: None,
        end_time: None,
    }
}

pub(super) struct Harness {
    pub(super) store: Arc<MemoryStore>,
    pub(super) audit: Arc<MemoryAuditSink>,
    pub(super) slots: Arc<ScheduleSlotService<MemoryStore>>,
    pub(super) schedules: Arc<ClassScheduleService<MemoryStore, MemoryStore>>,
}

pub(super) fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let audit = Arc::new(MemoryAuditSink::default());
    let slots = Arc::new(ScheduleSlotService::new(store.clone(), audit.clone()));
    let schedules = Arc::new(ClassScheduleService::new(
        store.clone(),
        store.clone(),
        audit.clone(),
    ));
    Harness {
        store,
        audit,
        slots,
        schedules,
    }
}

/// Slot store whose every call fails.
pub(super) struct UnavailableSlots;

impl ScheduleSlotRepository for UnavailableSlots {
    fn insert(&self, _slot: ScheduleSlot) -> Result<ScheduleSlot, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn update(&self, _slot: ScheduleSlot) -> Result<ScheduleSlot, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn soft_delete(&self, _id: SlotId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn fetch(&self, _id: SlotId) -> Result<Option<ScheduleSlot>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn fetch_by_number(
        &self,
        _dormitory_id: DormitoryId,
        _slot_number: u32,
    ) -> Result<Option<ScheduleSlot>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn list(
        &self,
        _filter: &ScheduleSlotFilter,
        _pagination: Pagination,
    ) -> Result<Page<ScheduleSlot>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
