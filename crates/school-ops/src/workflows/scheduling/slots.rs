use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use tracing::info;

use super::domain::{NewScheduleSlot, ScheduleSlot, ScheduleSlotFilter, ScheduleSlotUpdate};
use super::repository::ScheduleSlotRepository;
use crate::audit::{self, AuditEntry, AuditSink};
use crate::error::ServiceError;
use crate::locks::AdvisoryLocks;
use crate::store::{Page, PageRequest, Pagination, PaginationConfig, RepositoryError};
use crate::workflows::ids::{DormitoryId, SlotId};

const AUDIT_RESOURCE: &str = "schedule_slot";

/// Slot CRUD guarded by the per-dormitory conflict detector.
pub struct ScheduleSlotService<R> {
    repository: Arc<R>,
    audit: Arc<dyn AuditSink>,
    locks: AdvisoryLocks,
    pagination: PaginationConfig,
}

impl<R> ScheduleSlotService<R>
where
    R: ScheduleSlotRepository + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            repository,
            audit,
            locks: AdvisoryLocks::new(),
            pagination: PaginationConfig::default(),
        }
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Rejects a slot whose number is taken or whose `[start, end)` window
    /// overlaps any other slot of the dormitory, active or not. `exclude` skips
    /// the slot being updated.
    pub fn validate_slot(
        &self,
        dormitory_id: DormitoryId,
        slot_number: u32,
        start: NaiveTime,
        end: NaiveTime,
        exclude: Option<SlotId>,
    ) -> Result<(), ServiceError> {
        let is_other = |slot: &ScheduleSlot| Some(slot.id) != exclude;

        if let Some(existing) = self.repository.fetch_by_number(dormitory_id, slot_number)? {
            if is_other(&existing) {
                return Err(ServiceError::SlotNumberConflict);
            }
        }

        let filter = ScheduleSlotFilter::dormitory(dormitory_id);
        let mut pagination = Pagination::new(1, self.pagination.max_page_size);
        loop {
            let page = self.repository.list(&filter, pagination)?;
            if page
                .items
                .iter()
                .any(|slot| is_other(slot) && slot.overlaps(start, end))
            {
                return Err(ServiceError::SlotConflict);
            }

            if !page.has_more() || page.items.is_empty() {
                return Ok(());
            }
            pagination = pagination.next();
        }
    }

    pub fn create(&self, new_slot: NewScheduleSlot) -> Result<ScheduleSlot, ServiceError> {
        let name = validated_name(&new_slot.name)?;
        validate_window(new_slot.slot_number, new_slot.start_time, new_slot.end_time)?;

        let dormitory_id = new_slot.dormitory_id;
        let created = self.locks.with_lock(lock_key(dormitory_id), || -> Result<_, ServiceError> {
            self.validate_slot(
                dormitory_id,
                new_slot.slot_number,
                new_slot.start_time,
                new_slot.end_time,
                None,
            )?;

            let now = Utc::now();
            let slot = ScheduleSlot {
                id: SlotId::new(),
                dormitory_id,
                slot_number: new_slot.slot_number,
                name,
                start_time: new_slot.start_time,
                end_time: new_slot.end_time,
                active: new_slot.active,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };

            self.repository.insert(slot).map_err(number_conflict)
        })?;

        info!(
            slot_id = %created.id,
            dormitory_id = %created.dormitory_id,
            "schedule slot created"
        );
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "create", created.id)
                .with("dormitory_id", created.dormitory_id)
                .with("slot_number", created.slot_number),
        );

        Ok(created)
    }

    pub fn update(
        &self,
        id: SlotId,
        changes: ScheduleSlotUpdate,
    ) -> Result<ScheduleSlot, ServiceError> {
        let current = self.get(id)?;

        let mut next = current.clone();
        if let Some(name) = changes.name.as_deref() {
            next.name = validated_name(name)?;
        }
        if let Some(active) = changes.active {
            next.active = active;
        }
        next.slot_number = changes.slot_number.unwrap_or(current.slot_number);
        next.start_time = changes.start_time.unwrap_or(current.start_time);
        next.end_time = changes.end_time.unwrap_or(current.end_time);

        let reschedules = next.slot_number != current.slot_number
            || next.start_time != current.start_time
            || next.end_time != current.end_time;

        let key = lock_key(current.dormitory_id);
        let updated = self.locks.with_lock(key, || -> Result<_, ServiceError> {
            if reschedules {
                validate_window(next.slot_number, next.start_time, next.end_time)?;
                self.validate_slot(
                    next.dormitory_id,
                    next.slot_number,
                    next.start_time,
                    next.end_time,
                    Some(id),
                )?;
            }

            next.updated_at = Utc::now();
            self.repository.update(next).map_err(|err| match err {
                RepositoryError::NotFound => ServiceError::SlotNotFound,
                other => number_conflict(other),
            })
        })?;

        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "update", id).with("rescheduled", reschedules),
        );

        Ok(updated)
    }

    pub fn delete(&self, id: SlotId) -> Result<(), ServiceError> {
        self.get(id)?;
        self.repository.soft_delete(id).map_err(|err| match err {
            RepositoryError::NotFound => ServiceError::SlotNotFound,
            other => other.into(),
        })?;

        info!(slot_id = %id, "schedule slot deleted");
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "delete", id),
        );
        Ok(())
    }

    pub fn get(&self, id: SlotId) -> Result<ScheduleSlot, ServiceError> {
        self.repository
            .fetch(id)?
            .filter(|slot| !slot.is_deleted())
            .ok_or(ServiceError::SlotNotFound)
    }

    pub fn list(
        &self,
        filter: &ScheduleSlotFilter,
        page: PageRequest,
    ) -> Result<Page<ScheduleSlot>, ServiceError> {
        let pagination = page.normalize(&self.pagination);
        Ok(self.repository.list(filter, pagination)?)
    }
}

fn lock_key(dormitory_id: DormitoryId) -> String {
    format!("slots:{dormitory_id}")
}

fn validated_name(raw: &str) -> Result<String, ServiceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::bad_request("slot name must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_window(slot_number: u32, start: NaiveTime, end: NaiveTime) -> Result<(), ServiceError> {
    if slot_number == 0 {
        return Err(ServiceError::bad_request("slot number must be at least 1"));
    }
    if start >= end {
        return Err(ServiceError::bad_request(
            "slot start time must be before its end time",
        ));
    }
    Ok(())
}

/// The storage-level unique constraint backs up the pre-write number check.
fn number_conflict(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict => ServiceError::SlotNumberConflict,
        other => other.into(),
    }
}
