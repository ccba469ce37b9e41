//! Attendance sessions: opening, status submission with authority
//! overrides, and date-wide locking.

pub mod authority;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use authority::{
    LeavePermitAuthority, MedicalExemptionAuthority, OverrideCache, Resolution, StatusAuthority,
    StatusAuthorityResolver,
};
pub use domain::{
    AttendanceSession, LockSessionsOutcome, LockSessionsRequest, OpenSessionsOutcome,
    OpenSessionsRequest, SessionDetail, SessionFilter, SessionStatus, StudentAttendance,
    StudentAttendanceEntry, StudentAttendanceStatus, StudentSubmission, TeacherAttendance,
    TeacherAttendanceStatus, TeacherSubmission,
};
pub use repository::{AttendanceRecordRepository, AttendanceSessionRepository};
pub use router::attendance_router;
pub use service::AttendanceService;
