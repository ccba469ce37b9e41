//! Thread-safe in-memory backend for every repository trait.
//!
//! Unique constraints live here so concurrent check-then-write sequences can
//! never produce duplicates: one slot per `(dormitory, number)` among
//! non-deleted slots, one session per `(class schedule, date)`, one student
//! record per `(session, student)` and one teacher record per
//! `(session, teacher)`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};

use super::{Page, Pagination, RepositoryError};
use crate::workflows::attendance::{
    AttendanceRecordRepository, AttendanceSession, AttendanceSessionRepository, SessionFilter,
    SessionStatus, StudentAttendance, TeacherAttendance,
};
use crate::workflows::health::{HealthStatus, HealthStatusFilter, HealthStatusRepository};
use crate::workflows::ids::{
    ClassScheduleId, DormitoryId, HealthStatusId, LeavePermitId, SessionId, SlotId, StudentId,
    TeacherId,
};
use crate::workflows::leave::{LeavePermit, LeavePermitFilter, LeavePermitRepository};
use crate::workflows::scheduling::{
    ClassSchedule, ClassScheduleFilter, ClassScheduleRepository, ScheduleSlot,
    ScheduleSlotFilter, ScheduleSlotRepository,
};

#[derive(Debug, Default)]
struct Tables {
    slots: HashMap<SlotId, ScheduleSlot>,
    schedules: HashMap<ClassScheduleId, ClassSchedule>,
    permits: HashMap<LeavePermitId, LeavePermit>,
    health: HashMap<HealthStatusId, HealthStatus>,
    sessions: HashMap<SessionId, AttendanceSession>,
    students: HashMap<(SessionId, StudentId), StudentAttendance>,
    teachers: HashMap<(SessionId, TeacherId), TeacherAttendance>,
}

/// Cloning shares the underlying tables.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store poisoned".to_string()))
    }
}

fn slot_number_taken(tables: &Tables, slot: &ScheduleSlot) -> bool {
    tables.slots.values().any(|other| {
        other.id != slot.id
            && !other.is_deleted()
            && other.dormitory_id == slot.dormitory_id
            && other.slot_number == slot.slot_number
    })
}

impl ScheduleSlotRepository for MemoryStore {
    fn insert(&self, slot: ScheduleSlot) -> Result<ScheduleSlot, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.slots.contains_key(&slot.id) || slot_number_taken(&tables, &slot) {
            return Err(RepositoryError::Conflict);
        }
        tables.slots.insert(slot.id, slot.clone());
        Ok(slot)
    }

    fn update(&self, slot: ScheduleSlot) -> Result<ScheduleSlot, RepositoryError> {
        let mut tables = self.tables()?;
        match tables.slots.get(&slot.id) {
            Some(existing) if !existing.is_deleted() => {}
            _ => return Err(RepositoryError::NotFound),
        }
        if slot_number_taken(&tables, &slot) {
            return Err(RepositoryError::Conflict);
        }
        tables.slots.insert(slot.id, slot.clone());
        Ok(slot)
    }

    fn soft_delete(&self, id: SlotId) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let slot = tables
            .slots
            .get_mut(&id)
            .filter(|slot| !slot.is_deleted())
            .ok_or(RepositoryError::NotFound)?;
        let now = Utc::now();
        slot.deleted_at = Some(now);
        slot.updated_at = now;
        Ok(())
    }

    fn fetch(&self, id: SlotId) -> Result<Option<ScheduleSlot>, RepositoryError> {
        Ok(self.tables()?.slots.get(&id).cloned())
    }

    fn fetch_by_number(
        &self,
        dormitory_id: DormitoryId,
        slot_number: u32,
    ) -> Result<Option<ScheduleSlot>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .slots
            .values()
            .find(|slot| {
                !slot.is_deleted()
                    && slot.dormitory_id == dormitory_id
                    && slot.slot_number == slot_number
            })
            .cloned())
    }

    fn list(
        &self,
        filter: &ScheduleSlotFilter,
        pagination: Pagination,
    ) -> Result<Page<ScheduleSlot>, RepositoryError> {
        let tables = self.tables()?;
        let mut slots: Vec<_> = tables
            .slots
            .values()
            .filter(|slot| filter.matches(slot))
            .cloned()
            .collect();
        slots.sort_by_key(|slot| (slot.dormitory_id, slot.slot_number));
        Ok(pagination.apply(slots))
    }
}

impl ClassScheduleRepository for MemoryStore {
    fn insert(&self, schedule: ClassSchedule) -> Result<ClassSchedule, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.schedules.contains_key(&schedule.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    fn update(&self, schedule: ClassSchedule) -> Result<ClassSchedule, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.schedules.contains_key(&schedule.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    fn delete(&self, id: ClassScheduleId) -> Result<(), RepositoryError> {
        self.tables()?
            .schedules
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn fetch(&self, id: ClassScheduleId) -> Result<Option<ClassSchedule>, RepositoryError> {
        Ok(self.tables()?.schedules.get(&id).cloned())
    }

    fn list(
        &self,
        filter: &ClassScheduleFilter,
        pagination: Pagination,
    ) -> Result<Page<ClassSchedule>, RepositoryError> {
        let tables = self.tables()?;
        let mut schedules: Vec<_> = tables
            .schedules
            .values()
            .filter(|schedule| filter.matches(schedule))
            .cloned()
            .collect();
        schedules.sort_by_key(|schedule| {
            (
                schedule.day_of_week,
                schedule.timing.start_time,
                schedule.created_at,
            )
        });
        Ok(pagination.apply(schedules))
    }
}

impl LeavePermitRepository for MemoryStore {
    fn insert(&self, permit: LeavePermit) -> Result<LeavePermit, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.permits.contains_key(&permit.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.permits.insert(permit.id, permit.clone());
        Ok(permit)
    }

    fn update(&self, permit: LeavePermit) -> Result<LeavePermit, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.permits.contains_key(&permit.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.permits.insert(permit.id, permit.clone());
        Ok(permit)
    }

    fn fetch(&self, id: LeavePermitId) -> Result<Option<LeavePermit>, RepositoryError> {
        Ok(self.tables()?.permits.get(&id).cloned())
    }

    fn has_overlap(
        &self,
        student_id: StudentId,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<LeavePermitId>,
    ) -> Result<bool, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables.permits.values().any(|permit| {
            permit.student_id == student_id
                && Some(permit.id) != exclude
                && permit.overlaps(start, end)
        }))
    }

    fn active_on(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<LeavePermit>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .permits
            .values()
            .find(|permit| {
                permit.student_id == student_id
                    && permit.status.excuses_attendance()
                    && permit.covers(date)
            })
            .cloned())
    }

    fn list(
        &self,
        filter: &LeavePermitFilter,
        pagination: Pagination,
    ) -> Result<Page<LeavePermit>, RepositoryError> {
        let tables = self.tables()?;
        let mut permits: Vec<_> = tables
            .permits
            .values()
            .filter(|permit| filter.matches(permit))
            .cloned()
            .collect();
        permits.sort_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(pagination.apply(permits))
    }
}

impl HealthStatusRepository for MemoryStore {
    fn insert(&self, record: HealthStatus) -> Result<HealthStatus, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.health.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.health.insert(record.id, record.clone());
        Ok(record)
    }

    fn update(&self, record: HealthStatus) -> Result<HealthStatus, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.health.contains_key(&record.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.health.insert(record.id, record.clone());
        Ok(record)
    }

    fn fetch(&self, id: HealthStatusId) -> Result<Option<HealthStatus>, RepositoryError> {
        Ok(self.tables()?.health.get(&id).cloned())
    }

    fn active_on(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<HealthStatus>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .health
            .values()
            .find(|record| record.student_id == student_id && record.exempts_on(date))
            .cloned())
    }

    fn list(
        &self,
        filter: &HealthStatusFilter,
        pagination: Pagination,
    ) -> Result<Page<HealthStatus>, RepositoryError> {
        let tables = self.tables()?;
        let mut records: Vec<_> = tables
            .health
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(pagination.apply(records))
    }
}

impl AttendanceSessionRepository for MemoryStore {
    fn insert(&self, session: AttendanceSession) -> Result<AttendanceSession, RepositoryError> {
        let mut tables = self.tables()?;
        let duplicate = tables.sessions.values().any(|other| {
            other.id == session.id
                || (other.class_schedule_id == session.class_schedule_id
                    && other.date == session.date)
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    fn fetch(&self, id: SessionId) -> Result<Option<AttendanceSession>, RepositoryError> {
        Ok(self.tables()?.sessions.get(&id).cloned())
    }

    fn fetch_open(
        &self,
        class_schedule_id: ClassScheduleId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceSession>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .sessions
            .values()
            .find(|session| {
                session.class_schedule_id == class_schedule_id
                    && session.date == date
                    && session.status == SessionStatus::Open
            })
            .cloned())
    }

    fn lock_by_date(
        &self,
        date: NaiveDate,
        locked_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut tables = self.tables()?;
        let mut locked = 0;
        for session in tables.sessions.values_mut().filter(|s| s.date == date) {
            session.status = SessionStatus::Locked;
            session.locked_at = Some(locked_at);
            session.updated_at = locked_at;
            locked += 1;
        }
        Ok(locked)
    }

    fn list(
        &self,
        filter: &SessionFilter,
        pagination: Pagination,
    ) -> Result<Page<AttendanceSession>, RepositoryError> {
        let tables = self.tables()?;
        let mut sessions: Vec<_> = tables
            .sessions
            .values()
            .filter(|session| filter.matches(session))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(a.start_time.cmp(&b.start_time))
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(pagination.apply(sessions))
    }
}

impl AttendanceRecordRepository for MemoryStore {
    fn bulk_upsert_students(
        &self,
        records: Vec<StudentAttendance>,
    ) -> Result<Vec<StudentAttendance>, RepositoryError> {
        let mut tables = self.tables()?;
        let mut keys = Vec::with_capacity(records.len());
        for mut record in records {
            let key = (record.session_id, record.student_id);
            if let Some(existing) = tables.students.get(&key) {
                record.id = existing.id;
            }
            if !keys.contains(&key) {
                keys.push(key);
            }
            tables.students.insert(key, record);
        }
        Ok(keys
            .iter()
            .filter_map(|key| tables.students.get(key).cloned())
            .collect())
    }

    fn upsert_teacher(
        &self,
        mut record: TeacherAttendance,
    ) -> Result<TeacherAttendance, RepositoryError> {
        let mut tables = self.tables()?;
        let key = (record.session_id, record.teacher_id);
        if let Some(existing) = tables.teachers.get(&key) {
            record.id = existing.id;
        }
        tables.teachers.insert(key, record.clone());
        Ok(record)
    }

    fn students_for(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<StudentAttendance>, RepositoryError> {
        let tables = self.tables()?;
        let mut records: Vec<_> = tables
            .students
            .values()
            .filter(|record| record.session_id == session_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.student_id);
        Ok(records)
    }

    fn teacher_for(
        &self,
        session_id: SessionId,
        scheduled: TeacherId,
    ) -> Result<Option<TeacherAttendance>, RepositoryError> {
        let tables = self.tables()?;
        if let Some(record) = tables.teachers.get(&(session_id, scheduled)) {
            return Ok(Some(record.clone()));
        }
        Ok(tables
            .teachers
            .values()
            .filter(|record| record.session_id == session_id)
            .max_by_key(|record| (record.recorded_at, record.teacher_id))
            .cloned())
    }
}
