use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::workflows::ids::{
    ClassScheduleId, SessionId, StudentAttendanceId, StudentId, TeacherAttendanceId, TeacherId,
};

/// `Open -> Locked`; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Locked,
}

impl SessionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Locked => "locked",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SessionStatus {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "locked" => Ok(Self::Locked),
            other => Err(ServiceError::bad_request(format!(
                "invalid session status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentAttendanceStatus {
    Present,
    Absent,
    Permit,
    Sick,
}

impl StudentAttendanceStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Permit => "permit",
            Self::Sick => "sick",
        }
    }
}

impl fmt::Display for StudentAttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StudentAttendanceStatus {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "permit" => Ok(Self::Permit),
            "sick" => Ok(Self::Sick),
            other => Err(ServiceError::bad_request(format!(
                "invalid attendance status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeacherAttendanceStatus {
    Present,
    Absent,
}

impl TeacherAttendanceStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

impl FromStr for TeacherAttendanceStatus {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(ServiceError::bad_request(format!(
                "invalid teacher attendance status '{other}'"
            ))),
        }
    }
}

/// Attendance-taking instance for one class schedule on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub id: SessionId,
    pub class_schedule_id: ClassScheduleId,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    pub teacher_id: TeacherId,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceSession {
    pub fn is_locked(&self) -> bool {
        self.status == SessionStatus::Locked
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentAttendance {
    pub id: StudentAttendanceId,
    pub session_id: SessionId,
    pub student_id: StudentId,
    pub status: StudentAttendanceStatus,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherAttendance {
    pub id: TeacherAttendanceId,
    pub session_id: SessionId,
    pub teacher_id: TeacherId,
    pub status: TeacherAttendanceStatus,
    pub recorded_at: DateTime<Utc>,
}

/// A session together with everything recorded against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: AttendanceSession,
    pub students: Vec<StudentAttendance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<TeacherAttendance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenSessionsRequest {
    pub date: String,
    pub class_schedule_ids: Vec<String>,
}

/// Sessions created by an open call; schedules that already had an open
/// session for the date are listed in `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OpenSessionsOutcome {
    pub created: Vec<AttendanceSession>,
    pub skipped: Vec<ClassScheduleId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSessionsRequest {
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockSessionsOutcome {
    pub date: NaiveDate,
    pub locked: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentAttendanceEntry {
    pub student_id: String,
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSubmission {
    #[serde(default)]
    pub records: Vec<StudentAttendanceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherSubmission {
    /// Defaults to the session's teacher.
    #[serde(default)]
    pub teacher_id: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub class_schedule_id: Option<ClassScheduleId>,
    pub teacher_id: Option<TeacherId>,
    pub date: Option<NaiveDate>,
    pub status: Option<SessionStatus>,
}

impl SessionFilter {
    pub fn matches(&self, session: &AttendanceSession) -> bool {
        self.class_schedule_id
            .map_or(true, |id| session.class_schedule_id == id)
            && self.teacher_id.map_or(true, |id| session.teacher_id == id)
            && self.date.map_or(true, |date| session.date == date)
            && self.status.map_or(true, |status| session.status == status)
    }
}
