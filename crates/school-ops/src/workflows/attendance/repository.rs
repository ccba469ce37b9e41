use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{AttendanceSession, SessionFilter, StudentAttendance, TeacherAttendance};
use crate::store::{Page, Pagination, RepositoryError};
use crate::workflows::ids::{ClassScheduleId, SessionId, TeacherId};

/// Storage abstraction for attendance sessions.
///
/// `insert` must reject a second session for the same
/// `(class_schedule_id, date)` with [`RepositoryError::Conflict`].
pub trait AttendanceSessionRepository: Send + Sync {
    fn insert(&self, session: AttendanceSession) -> Result<AttendanceSession, RepositoryError>;
    fn fetch(&self, id: SessionId) -> Result<Option<AttendanceSession>, RepositoryError>;
    fn fetch_open(
        &self,
        class_schedule_id: ClassScheduleId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceSession>, RepositoryError>;
    /// Locks every session dated `date`; returns how many were touched.
    fn lock_by_date(
        &self,
        date: NaiveDate,
        locked_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError>;
    /// Sessions matching `filter`, newest date first.
    fn list(
        &self,
        filter: &SessionFilter,
        pagination: Pagination,
    ) -> Result<Page<AttendanceSession>, RepositoryError>;
}

/// Storage abstraction for per-session student and teacher records.
pub trait AttendanceRecordRepository: Send + Sync {
    /// Writes the whole batch or nothing, keyed by `(session, student)`.
    /// Existing records keep their identifier.
    fn bulk_upsert_students(
        &self,
        records: Vec<StudentAttendance>,
    ) -> Result<Vec<StudentAttendance>, RepositoryError>;
    /// Keyed by `(session, teacher)`.
    fn upsert_teacher(&self, record: TeacherAttendance)
        -> Result<TeacherAttendance, RepositoryError>;
    fn students_for(&self, session_id: SessionId)
        -> Result<Vec<StudentAttendance>, RepositoryError>;
    /// The record for `scheduled` when one exists, otherwise the most
    /// recently recorded substitute.
    fn teacher_for(
        &self,
        session_id: SessionId,
        scheduled: TeacherId,
    ) -> Result<Option<TeacherAttendance>, RepositoryError>;
}
