use chrono::NaiveDate;

use super::domain::{LeavePermit, LeavePermitFilter};
use crate::store::{Page, Pagination, RepositoryError};
use crate::workflows::ids::{LeavePermitId, StudentId};

/// Storage abstraction for leave permits.
pub trait LeavePermitRepository: Send + Sync {
    fn insert(&self, permit: LeavePermit) -> Result<LeavePermit, RepositoryError>;
    fn update(&self, permit: LeavePermit) -> Result<LeavePermit, RepositoryError>;
    fn fetch(&self, id: LeavePermitId) -> Result<Option<LeavePermit>, RepositoryError>;

    /// `true` when any permit of the student, whatever its status, shares a
    /// day with `[start, end]`. `exclude` skips the permit being revalidated.
    fn has_overlap(
        &self,
        student_id: StudentId,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<LeavePermitId>,
    ) -> Result<bool, RepositoryError>;

    /// The permit excusing the student on `date`.
    ///
    /// Absence of a permit may be reported either as `Ok(None)` or as
    /// [`RepositoryError::NotFound`].
    fn active_on(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<LeavePermit>, RepositoryError>;

    /// Permits matching `filter`, newest start date first.
    fn list(
        &self,
        filter: &LeavePermitFilter,
        pagination: Pagination,
    ) -> Result<Page<LeavePermit>, RepositoryError>;
}
