//! Authorities that can force a student's attendance status, consulted in a
//! fixed priority order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use super::domain::StudentAttendanceStatus;
use crate::error::ServiceError;
use crate::store::RepositoryError;
use crate::workflows::health::HealthStatusRepository;
use crate::workflows::ids::StudentId;
use crate::workflows::leave::LeavePermitRepository;

/// Source of a forced status for a student on a date.
pub trait StatusAuthority: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the authority has nothing to say about the student.
    fn query_override(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<StudentAttendanceStatus>, ServiceError>;
}

/// "Not found" is an answer, anything else aborts the caller.
fn lookup<T>(
    authority: &'static str,
    result: Result<Option<T>, RepositoryError>,
) -> Result<Option<T>, ServiceError> {
    match result {
        Ok(found) => Ok(found),
        Err(RepositoryError::NotFound) => Ok(None),
        Err(err) => Err(ServiceError::internal(format!(
            "{authority} lookup failed: {err}"
        ))),
    }
}

/// Active medical exemption covering the date → `Sick`.
pub struct MedicalExemptionAuthority<H> {
    repository: Arc<H>,
}

impl<H> MedicalExemptionAuthority<H> {
    pub fn new(repository: Arc<H>) -> Self {
        Self { repository }
    }
}

impl<H> StatusAuthority for MedicalExemptionAuthority<H>
where
    H: HealthStatusRepository,
{
    fn name(&self) -> &'static str {
        "medical_exemption"
    }

    fn query_override(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<StudentAttendanceStatus>, ServiceError> {
        let record = lookup(self.name(), self.repository.active_on(student_id, date))?;
        Ok(record
            .filter(|record| record.exempts_on(date))
            .map(|_| StudentAttendanceStatus::Sick))
    }
}

/// Approved leave permit covering the date → `Permit`.
pub struct LeavePermitAuthority<L> {
    repository: Arc<L>,
}

impl<L> LeavePermitAuthority<L> {
    pub fn new(repository: Arc<L>) -> Self {
        Self { repository }
    }
}

impl<L> StatusAuthority for LeavePermitAuthority<L>
where
    L: LeavePermitRepository,
{
    fn name(&self) -> &'static str {
        "leave_permit"
    }

    fn query_override(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<StudentAttendanceStatus>, ServiceError> {
        let permit = lookup(self.name(), self.repository.active_on(student_id, date))?;
        Ok(permit
            .filter(|permit| permit.status.excuses_attendance() && permit.covers(date))
            .map(|_| StudentAttendanceStatus::Permit))
    }
}

/// Outcome of resolving one submitted status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub status: StudentAttendanceStatus,
    pub overridden: bool,
}

/// Per-submission memo of authority answers.
#[derive(Debug, Default)]
pub struct OverrideCache {
    entries: HashMap<(StudentId, NaiveDate), Option<StudentAttendanceStatus>>,
}

impl OverrideCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered chain of authorities; the first one to answer wins.
#[derive(Clone)]
pub struct StatusAuthorityResolver {
    authorities: Vec<Arc<dyn StatusAuthority>>,
}

impl StatusAuthorityResolver {
    pub fn new(authorities: Vec<Arc<dyn StatusAuthority>>) -> Self {
        Self { authorities }
    }

    /// Medical exemptions first, then leave permits.
    pub fn standard<H, L>(health: Arc<H>, leave: Arc<L>) -> Self
    where
        H: HealthStatusRepository + 'static,
        L: LeavePermitRepository + 'static,
    {
        let medical: Arc<dyn StatusAuthority> = Arc::new(MedicalExemptionAuthority::new(health));
        let permits: Arc<dyn StatusAuthority> = Arc::new(LeavePermitAuthority::new(leave));
        Self::new(vec![medical, permits])
    }

    pub fn authority_names(&self) -> Vec<&'static str> {
        self.authorities.iter().map(|a| a.name()).collect()
    }

    pub fn resolve(
        &self,
        student_id: StudentId,
        date: NaiveDate,
        submitted: StudentAttendanceStatus,
        cache: &mut OverrideCache,
    ) -> Result<Resolution, ServiceError> {
        let forced = match cache.entries.get(&(student_id, date)) {
            Some(cached) => *cached,
            None => {
                let forced = self.first_override(student_id, date)?;
                cache.entries.insert((student_id, date), forced);
                forced
            }
        };

        Ok(match forced {
            Some(status) => Resolution {
                status,
                overridden: true,
            },
            None => Resolution {
                status: submitted,
                overridden: false,
            },
        })
    }

    fn first_override(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<StudentAttendanceStatus>, ServiceError> {
        for authority in &self.authorities {
            if let Some(status) = authority.query_override(student_id, date)? {
                debug!(
                    authority = authority.name(),
                    student_id = %student_id,
                    %date,
                    status = status.label(),
                    "attendance status overridden"
                );
                return Ok(Some(status));
            }
        }
        Ok(None)
    }
}
