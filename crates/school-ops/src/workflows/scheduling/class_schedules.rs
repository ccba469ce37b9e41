use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{ClassSchedule, ClassScheduleChanges, ClassScheduleDraft, ClassScheduleFilter};
use super::repository::{ClassScheduleRepository, ScheduleSlotRepository};
use super::timing::resolve_timing;
use crate::audit::{self, AuditEntry, AuditSink};
use crate::error::ServiceError;
use crate::store::{Page, PageRequest, PaginationConfig, RepositoryError};
use crate::workflows::calendar::DayOfWeek;
use crate::workflows::ids::{
    parse_optional, ClassId, ClassScheduleId, DormitoryId, SlotId, SubjectId, TeacherId,
};

const AUDIT_RESOURCE: &str = "class_schedule";

/// Class schedule CRUD; every timing change goes through [`resolve_timing`].
pub struct ClassScheduleService<C, S> {
    schedules: Arc<C>,
    slots: Arc<S>,
    audit: Arc<dyn AuditSink>,
    pagination: PaginationConfig,
}

impl<C, S> ClassScheduleService<C, S>
where
    C: ClassScheduleRepository + 'static,
    S: ScheduleSlotRepository + 'static,
{
    pub fn new(schedules: Arc<C>, slots: Arc<S>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            schedules,
            slots,
            audit,
            pagination: PaginationConfig::default(),
        }
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn create(&self, draft: ClassScheduleDraft) -> Result<ClassSchedule, ServiceError> {
        let class_id = ClassId::parse(&draft.class_id)?;
        let teacher_id = TeacherId::parse(&draft.teacher_id)?;
        let dormitory_id = DormitoryId::parse(&draft.dormitory_id)?;
        let subject_id = parse_optional(draft.subject_id.as_deref(), SubjectId::parse)?;
        let day_of_week: DayOfWeek = draft.day_of_week.parse()?;
        let slot_id = parse_optional(draft.slot_id.as_deref(), SlotId::parse)?;

        let timing = resolve_timing(
            self.slots.as_ref(),
            dormitory_id,
            slot_id,
            draft.start_time.as_deref(),
            draft.end_time.as_deref(),
        )?;

        let now = Utc::now();
        let schedule = ClassSchedule {
            id: ClassScheduleId::new(),
            class_id,
            teacher_id,
            dormitory_id,
            subject_id,
            day_of_week,
            timing,
            created_at: now,
            updated_at: now,
        };

        let created = self.schedules.insert(schedule)?;
        info!(
            schedule_id = %created.id,
            slot_bound = created.timing.is_slot_bound(),
            "class schedule created"
        );
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "create", created.id)
                .with("class_id", created.class_id)
                .with("day_of_week", created.day_of_week),
        );

        Ok(created)
    }

    pub fn update(
        &self,
        id: ClassScheduleId,
        changes: ClassScheduleChanges,
    ) -> Result<ClassSchedule, ServiceError> {
        let mut schedule = self.get(id)?;
        let previous_dormitory = schedule.dormitory_id;

        if let Some(raw) = changes.class_id.as_deref() {
            schedule.class_id = ClassId::parse(raw)?;
        }
        if let Some(raw) = changes.teacher_id.as_deref() {
            schedule.teacher_id = TeacherId::parse(raw)?;
        }
        if let Some(raw) = changes.dormitory_id.as_deref() {
            schedule.dormitory_id = DormitoryId::parse(raw)?;
        }
        if changes.subject_id.is_some() {
            schedule.subject_id = parse_optional(changes.subject_id.as_deref(), SubjectId::parse)?;
        }
        if let Some(raw) = changes.day_of_week.as_deref() {
            schedule.day_of_week = raw.parse()?;
        }

        if changes.touches_timing() {
            let slot_id = parse_optional(changes.slot_id.as_deref(), SlotId::parse)?;
            schedule.timing = resolve_timing(
                self.slots.as_ref(),
                schedule.dormitory_id,
                slot_id,
                changes.start_time.as_deref(),
                changes.end_time.as_deref(),
            )?;
        } else if schedule.dormitory_id != previous_dormitory {
            if let Some(slot_id) = schedule.timing.slot_id {
                schedule.timing = resolve_timing(
                    self.slots.as_ref(),
                    schedule.dormitory_id,
                    Some(slot_id),
                    None,
                    None,
                )?;
            }
        }

        schedule.updated_at = Utc::now();
        let updated = self.schedules.update(schedule).map_err(not_found)?;
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "update", id)
                .with("retimed", changes.touches_timing()),
        );

        Ok(updated)
    }

    pub fn delete(&self, id: ClassScheduleId) -> Result<(), ServiceError> {
        self.get(id)?;
        self.schedules.delete(id).map_err(not_found)?;

        info!(schedule_id = %id, "class schedule deleted");
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "delete", id),
        );
        Ok(())
    }

    pub fn get(&self, id: ClassScheduleId) -> Result<ClassSchedule, ServiceError> {
        self.schedules
            .fetch(id)?
            .ok_or(ServiceError::ClassScheduleNotFound)
    }

    pub fn list(
        &self,
        filter: &ClassScheduleFilter,
        page: PageRequest,
    ) -> Result<Page<ClassSchedule>, ServiceError> {
        let pagination = page.normalize(&self.pagination);
        Ok(self.schedules.list(filter, pagination)?)
    }
}

fn not_found(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::NotFound => ServiceError::ClassScheduleNotFound,
        other => other.into(),
    }
}
