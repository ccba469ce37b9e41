use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::workflows::ids::{HealthStatusId, StudentId, UserId};
use crate::workflows::interval;

/// `Active -> Revoked`; revoked records never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatusState {
    Active,
    Revoked,
}

impl HealthStatusState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for HealthStatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HealthStatusState {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "revoked" => Ok(Self::Revoked),
            other => Err(ServiceError::bad_request(format!(
                "invalid health status '{other}'"
            ))),
        }
    }
}

/// Medical exemption for a student, open-ended when `end_date` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub id: HealthStatusId,
    pub student_id: StudentId,
    pub diagnosis: String,
    pub notes: String,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub status: HealthStatusState,
    pub created_by: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HealthStatus {
    pub fn is_active(&self) -> bool {
        self.status == HealthStatusState::Active
    }

    /// Active and covering `date`.
    pub fn exempts_on(&self, date: NaiveDate) -> bool {
        self.is_active() && interval::covers(self.start_date, self.end_date, date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatusRequest {
    pub student_id: String,
    pub diagnosis: String,
    #[serde(default)]
    pub notes: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub created_by: String,
}

/// Amendments allowed while a record is active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatusChanges {
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthStatusFilter {
    pub student_id: Option<StudentId>,
    pub status: Option<HealthStatusState>,
}

impl HealthStatusFilter {
    pub fn matches(&self, record: &HealthStatus) -> bool {
        self.student_id.map_or(true, |id| record.student_id == id)
            && self.status.map_or(true, |status| record.status == status)
    }
}
