use chrono::NaiveDate;

use super::domain::{HealthStatus, HealthStatusFilter};
use crate::store::{Page, Pagination, RepositoryError};
use crate::workflows::ids::{HealthStatusId, StudentId};

/// Storage abstraction for medical exemptions.
pub trait HealthStatusRepository: Send + Sync {
    fn insert(&self, record: HealthStatus) -> Result<HealthStatus, RepositoryError>;
    fn update(&self, record: HealthStatus) -> Result<HealthStatus, RepositoryError>;
    fn fetch(&self, id: HealthStatusId) -> Result<Option<HealthStatus>, RepositoryError>;

    /// The active record covering `date`, if any.
    ///
    /// Absence may be reported either as `Ok(None)` or as
    /// [`RepositoryError::NotFound`].
    fn active_on(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Result<Option<HealthStatus>, RepositoryError>;

    /// Records matching `filter`, newest start date first.
    fn list(
        &self,
        filter: &HealthStatusFilter,
        pagination: Pagination,
    ) -> Result<Page<HealthStatus>, RepositoryError>;
}
