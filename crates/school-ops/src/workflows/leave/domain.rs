use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::workflows::ids::{LeavePermitId, StudentId, UserId};
use crate::workflows::interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    HomeLeave,
    OfficialDuty,
}

impl LeaveType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::HomeLeave => "home_leave",
            Self::OfficialDuty => "official_duty",
        }
    }
}

impl FromStr for LeaveType {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home_leave" => Ok(Self::HomeLeave),
            "official_duty" => Ok(Self::OfficialDuty),
            other => Err(ServiceError::bad_request(format!(
                "invalid leave type '{other}'"
            ))),
        }
    }
}

/// Workflow state of a permit: `Pending -> Approved -> Completed` or
/// `Pending -> Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeavePermitStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl LeavePermitStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Completed)
        )
    }

    /// Only approved permits excuse a student from class.
    pub const fn excuses_attendance(self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for LeavePermitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LeavePermitStatus {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "completed" => Ok(Self::Completed),
            other => Err(ServiceError::bad_request(format!(
                "invalid leave permit status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePermit {
    pub id: LeavePermitId,
    pub student_id: StudentId,
    pub leave_type: LeaveType,
    pub reason: String,
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    pub status: LeavePermitStatus,
    pub created_by: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeavePermit {
    pub fn covers(&self, date: NaiveDate) -> bool {
        interval::covers(self.start_date, Some(self.end_date), date)
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        interval::dates_overlap(self.start_date, self.end_date, start, end)
    }
}

/// Raw permit request as submitted by staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePermitRequest {
    pub student_id: String,
    pub leave_type: String,
    #[serde(default)]
    pub reason: String,
    pub start_date: String,
    pub end_date: String,
    pub created_by: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeavePermitFilter {
    pub student_id: Option<StudentId>,
    pub status: Option<LeavePermitStatus>,
    pub leave_type: Option<LeaveType>,
}

impl LeavePermitFilter {
    pub fn matches(&self, permit: &LeavePermit) -> bool {
        self.student_id.map_or(true, |id| permit.student_id == id)
            && self.status.map_or(true, |status| permit.status == status)
            && self.leave_type.map_or(true, |kind| permit.leave_type == kind)
    }
}
