use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use super::authority::{OverrideCache, StatusAuthorityResolver};
use super::domain::{
    AttendanceSession, LockSessionsOutcome, OpenSessionsOutcome, OpenSessionsRequest,
    SessionDetail, SessionFilter, SessionStatus, StudentAttendance, StudentAttendanceStatus,
    StudentSubmission, TeacherAttendance, TeacherAttendanceStatus, TeacherSubmission,
};
use super::repository::{AttendanceRecordRepository, AttendanceSessionRepository};
use crate::audit::{self, AuditEntry, AuditSink};
use crate::error::ServiceError;
use crate::locks::AdvisoryLocks;
use crate::store::{Page, PageRequest, PaginationConfig, RepositoryError};
use crate::workflows::calendar::parse_date;
use crate::workflows::ids::{
    ClassScheduleId, SessionId, StudentAttendanceId, StudentId, TeacherAttendanceId, TeacherId,
};
use crate::workflows::scheduling::{ClassSchedule, ClassScheduleRepository};

const AUDIT_RESOURCE: &str = "attendance_session";

/// Session lifecycle: open, record, lock.
pub struct AttendanceService<S, R, C> {
    sessions: Arc<S>,
    records: Arc<R>,
    schedules: Arc<C>,
    resolver: StatusAuthorityResolver,
    audit: Arc<dyn AuditSink>,
    locks: AdvisoryLocks,
    pagination: PaginationConfig,
}

impl<S, R, C> AttendanceService<S, R, C>
where
    S: AttendanceSessionRepository + 'static,
    R: AttendanceRecordRepository + 'static,
    C: ClassScheduleRepository + 'static,
{
    pub fn new(
        sessions: Arc<S>,
        records: Arc<R>,
        schedules: Arc<C>,
        resolver: StatusAuthorityResolver,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            sessions,
            records,
            schedules,
            resolver,
            audit,
            locks: AdvisoryLocks::new(),
            pagination: PaginationConfig::default(),
        }
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Opens one session per schedule for the date. Schedules that already
    /// have a session for the date are skipped, so repeated calls are no-ops.
    pub fn open_sessions(
        &self,
        request: OpenSessionsRequest,
    ) -> Result<OpenSessionsOutcome, ServiceError> {
        let date = parse_date(&request.date)?;
        if request.class_schedule_ids.is_empty() {
            return Err(ServiceError::bad_request(
                "class_schedule_ids must not be empty",
            ));
        }

        let ids = request
            .class_schedule_ids
            .iter()
            .map(|raw| ClassScheduleId::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let mut schedules = Vec::with_capacity(ids.len());
        for id in ids {
            let schedule = self
                .schedules
                .fetch(id)?
                .ok_or(ServiceError::ClassScheduleNotFound)?;
            schedules.push(schedule);
        }

        let mut outcome = OpenSessionsOutcome::default();
        for schedule in schedules {
            match self.open_one(&schedule, date)? {
                Some(session) => outcome.created.push(session),
                None => outcome.skipped.push(schedule.id),
            }
        }

        info!(
            %date,
            created = outcome.created.len(),
            skipped = outcome.skipped.len(),
            "attendance sessions opened"
        );
        Ok(outcome)
    }

    fn open_one(
        &self,
        schedule: &ClassSchedule,
        date: NaiveDate,
    ) -> Result<Option<AttendanceSession>, ServiceError> {
        let key = format!("sessions:{}:{date}", schedule.id);
        let created = self.locks.with_lock(key, || -> Result<_, ServiceError> {
            if self.sessions.fetch_open(schedule.id, date)?.is_some() {
                return Ok(None);
            }

            let now = Utc::now();
            let session = AttendanceSession {
                id: SessionId::new(),
                class_schedule_id: schedule.id,
                date,
                start_time: Some(schedule.timing.start_time),
                end_time: Some(schedule.timing.end_time),
                teacher_id: schedule.teacher_id,
                status: SessionStatus::Open,
                locked_at: None,
                created_at: now,
                updated_at: now,
            };

            match self.sessions.insert(session) {
                Ok(session) => Ok(Some(session)),
                Err(RepositoryError::Conflict) => Ok(None),
                Err(err) => Err(ServiceError::from(err)),
            }
        })?;

        if let Some(session) = &created {
            audit::record(
                self.audit.as_ref(),
                AuditEntry::new(AUDIT_RESOURCE, "open", session.id)
                    .with("class_schedule_id", session.class_schedule_id)
                    .with("date", session.date),
            );
        }
        Ok(created)
    }

    /// Records student attendance in one batch. Each submitted status may be
    /// replaced by a medical exemption or an approved leave permit.
    pub fn submit_students(
        &self,
        session_id: SessionId,
        submission: StudentSubmission,
    ) -> Result<Vec<StudentAttendance>, ServiceError> {
        let session = self.writable(session_id)?;
        if submission.records.is_empty() {
            return Err(ServiceError::bad_request("records must not be empty"));
        }

        // A student listed twice keeps the position of the first entry and
        // the values of the last.
        let mut parsed = Vec::with_capacity(submission.records.len());
        let mut positions = HashMap::new();
        for entry in submission.records {
            let student_id = StudentId::parse(&entry.student_id)?;
            let status: StudentAttendanceStatus = entry.status.parse()?;
            let note = entry.note.unwrap_or_default().trim().to_string();
            match positions.get(&student_id) {
                Some(&index) => parsed[index] = (student_id, status, note),
                None => {
                    positions.insert(student_id, parsed.len());
                    parsed.push((student_id, status, note));
                }
            }
        }

        let mut cache = OverrideCache::new();
        let mut overridden = 0usize;
        let mut records = Vec::with_capacity(parsed.len());
        for (student_id, submitted, note) in parsed {
            let resolution = self
                .resolver
                .resolve(student_id, session.date, submitted, &mut cache)?;
            if resolution.overridden {
                overridden += 1;
            }
            records.push(StudentAttendance {
                id: StudentAttendanceId::new(),
                session_id,
                student_id,
                status: resolution.status,
                note,
            });
        }

        let saved = self.records.bulk_upsert_students(records)?;
        info!(
            session_id = %session_id,
            records = saved.len(),
            overridden,
            "student attendance recorded"
        );
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "submit_students", session_id)
                .with("records", saved.len())
                .with("overridden", overridden),
        );
        Ok(saved)
    }

    pub fn submit_teacher(
        &self,
        session_id: SessionId,
        submission: TeacherSubmission,
    ) -> Result<TeacherAttendance, ServiceError> {
        let session = self.writable(session_id)?;
        let teacher_id = match submission.teacher_id.as_deref().map(str::trim) {
            None | Some("") => session.teacher_id,
            Some(raw) => TeacherId::parse(raw)?,
        };
        let status: TeacherAttendanceStatus = submission.status.parse()?;

        if teacher_id != session.teacher_id {
            warn!(
                session_id = %session_id,
                teacher_id = %teacher_id,
                "teacher attendance recorded for a substitute"
            );
        }

        let saved = self.records.upsert_teacher(TeacherAttendance {
            id: TeacherAttendanceId::new(),
            session_id,
            teacher_id,
            status,
            recorded_at: Utc::now(),
        })?;

        info!(
            session_id = %session_id,
            status = status.label(),
            "teacher attendance recorded"
        );
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "submit_teacher", session_id)
                .with("teacher_id", teacher_id)
                .with("status", status.label()),
        );
        Ok(saved)
    }

    /// Locks every session on the date, whatever its current state.
    pub fn lock_sessions_for_date(&self, date: &str) -> Result<LockSessionsOutcome, ServiceError> {
        let date = parse_date(date)?;
        let locked = self.sessions.lock_by_date(date, Utc::now())?;

        info!(%date, locked, "attendance sessions locked");
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AUDIT_RESOURCE, "lock", date).with("locked", locked),
        );
        Ok(LockSessionsOutcome { date, locked })
    }

    pub fn get(&self, session_id: SessionId) -> Result<SessionDetail, ServiceError> {
        let session = self.session(session_id)?;
        let students = self.records.students_for(session_id)?;
        let teacher = self.records.teacher_for(session_id, session.teacher_id)?;
        Ok(SessionDetail {
            session,
            students,
            teacher,
        })
    }

    pub fn list(
        &self,
        filter: &SessionFilter,
        page: PageRequest,
    ) -> Result<Page<AttendanceSession>, ServiceError> {
        let pagination = page.normalize(&self.pagination);
        Ok(self.sessions.list(filter, pagination)?)
    }

    fn session(&self, session_id: SessionId) -> Result<AttendanceSession, ServiceError> {
        self.sessions
            .fetch(session_id)?
            .ok_or(ServiceError::AttendanceSessionNotFound)
    }

    fn writable(&self, session_id: SessionId) -> Result<AttendanceSession, ServiceError> {
        let session = self.session(session_id)?;
        if session.is_locked() {
            return Err(ServiceError::AttendanceAlreadyLocked);
        }
        Ok(session)
    }
}
