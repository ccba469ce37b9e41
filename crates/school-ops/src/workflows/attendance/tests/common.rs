use std::sync::Arc;

use axum::response::Response;
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use crate::audit::MemoryAuditSink;
use crate::store::{MemoryStore, Page, Pagination, RepositoryError};
use crate::workflows::attendance::{
    AttendanceService, OpenSessionsRequest, StatusAuthorityResolver, StudentAttendanceEntry,
    StudentSubmission,
};
use crate::workflows::health::{
    HealthStatus, HealthStatusFilter, HealthStatusRepository, HealthStatusRequest,
    HealthStatusService,
};
use crate::workflows::ids::{
    ClassId, ClassScheduleId, DormitoryId, HealthStatusId, SessionId, StudentId, TeacherId, UserId,
};
use crate::workflows::leave::{LeavePermitRequest, LeavePermitService};
use crate::workflows::calendar::DayOfWeek;
use crate::workflows::scheduling::{ClassSchedule, ClassScheduleRepository, ScheduleTiming};

pub(super) type Attendance = AttendanceService<MemoryStore, MemoryStore, MemoryStore>;

pub(super) fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
}

pub(super) struct Harness {
    pub(super) store: Arc<MemoryStore>,
    pub(super) audit: Arc<MemoryAuditSink>,
    pub(super) attendance: Arc<Attendance>,
    pub(super) leave: LeavePermitService<MemoryStore>,
    pub(super) health: HealthStatusService<MemoryStore>,
}

pub(super) fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let audit = Arc::new(MemoryAuditSink::default());
    let resolver = StatusAuthorityResolver::standard(store.clone(), store.clone());
    let attendance = Arc::new(AttendanceService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        resolver,
        audit.clone(),
    ));
    Harness {
        leave: LeavePermitService::new(store.clone(), audit.clone()),
        health: HealthStatusService::new(store.clone(), audit.clone()),
        store,
        audit,
        attendance,
    }
}

impl Harness {
    pub(super) fn schedule(&self) -> ClassSchedule {
        let now = chrono::Utc::now();
        let schedule = ClassSchedule {
            id: ClassScheduleId::new(),
            class_id: ClassId::new(),
            teacher_id: TeacherId::new(),
            dormitory_id: DormitoryId::new(),
            subject_id: None,
            day_of_week: DayOfWeek::Saturday,
            timing: ScheduleTiming {
                start_time: NaiveTime::from_hms_opt(8, 0, 0).expect("time"),
                end_time: NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
                slot_id: None,
            },
            created_at: now,
            updated_at: now,
        };
        ClassScheduleRepository::insert(self.store.as_ref(), schedule).expect("schedule stored")
    }

    pub(super) fn open(&self, schedule: &ClassSchedule, on: &str) -> SessionId {
        let outcome = self
            .attendance
            .open_sessions(OpenSessionsRequest {
                date: on.to_string(),
                class_schedule_ids: vec![schedule.id.to_string()],
            })
            .expect("sessions opened");
        outcome.created[0].id
    }

    pub(super) fn approved_permit(&self, student: StudentId, start: &str, end: &str) {
        let permit = self
            .leave
            .create(permit_request(student, start, end))
            .expect("permit");
        self.leave
            .approve(permit.id, UserId::new())
            .expect("approved");
    }

    pub(super) fn sick(
        &self,
        student: StudentId,
        start: &str,
        end: Option<&str>,
    ) -> HealthStatus {
        self.health
            .create(HealthStatusRequest {
                student_id: student.to_string(),
                diagnosis: "Influenza".to_string(),
                notes: String::new(),
                start_date: start.to_string(),
                end_date: end.map(str::to_string),
                created_by: UserId::new().to_string(),
            })
            .expect("health status")
    }
}

pub(super) fn permit_request(student: StudentId, start: &str, end: &str) -> LeavePermitRequest {
    LeavePermitRequest {
        student_id: student.to_string(),
        leave_type: "home_leave".to_string(),
        reason: "Family visit".to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        created_by: UserId::new().to_string(),
    }
}

pub(super) fn entry(student: StudentId, status: &str) -> StudentAttendanceEntry {
    StudentAttendanceEntry {
        student_id: student.to_string(),
        status: status.to_string(),
        note: None,
    }
}

pub(super) fn submission(entries: Vec<StudentAttendanceEntry>) -> StudentSubmission {
    StudentSubmission { records: entries }
}

/// Health store that reports absence as an error.
pub(super) struct NotFoundHealth;

/// Health store that is down.
pub(super) struct UnavailableHealth;

impl HealthStatusRepository for NotFoundHealth {
    fn insert(&self, _record: HealthStatus) -> Result<HealthStatus, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn update(&self, _record: HealthStatus) -> Result<HealthStatus, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _id: HealthStatusId) -> Result<Option<HealthStatus>, RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    fn active_on(
        &self,
        _student_id: StudentId,
        _date: NaiveDate,
    ) -> Result<Option<HealthStatus>, RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    fn list(
        &self,
        _filter: &HealthStatusFilter,
        pagination: Pagination,
    ) -> Result<Page<HealthStatus>, RepositoryError> {
        Ok(pagination.apply(Vec::new()))
    }
}

impl HealthStatusRepository for UnavailableHealth {
    fn insert(&self, _record: HealthStatus) -> Result<HealthStatus, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn update(&self, _record: HealthStatus) -> Result<HealthStatus, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn fetch(&self, _id: HealthStatusId) -> Result<Option<HealthStatus>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn active_on(
        &self,
        _student_id: StudentId,
        _date: NaiveDate,
    ) -> Result<Option<HealthStatus>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn list(
        &self,
        _filter: &HealthStatusFilter,
        _pagination: Pagination,
    ) -> Result<Page<HealthStatus>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}

/// Attendance service over `store` whose medical authority is `health`.
pub(super) fn attendance_with_health<H>(
    store: Arc<MemoryStore>,
    health: Arc<H>,
) -> AttendanceService<MemoryStore, MemoryStore, MemoryStore>
where
    H: HealthStatusRepository + 'static,
{
    AttendanceService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        StatusAuthorityResolver::standard(health, store),
        Arc::new(MemoryAuditSink::default()),
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
