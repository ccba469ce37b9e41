use super::domain::{ClassSchedule, ClassScheduleFilter, ScheduleSlot, ScheduleSlotFilter};
use crate::store::{Page, Pagination, RepositoryError};
use crate::workflows::ids::{ClassScheduleId, DormitoryId, SlotId};

/// Storage abstraction for schedule slots.
///
/// `insert` must reject a second non-deleted slot with the same
/// `(dormitory, slot_number)` with [`RepositoryError::Conflict`].
pub trait ScheduleSlotRepository: Send + Sync {
    fn insert(&self, slot: ScheduleSlot) -> Result<ScheduleSlot, RepositoryError>;
    fn update(&self, slot: ScheduleSlot) -> Result<ScheduleSlot, RepositoryError>;
    fn soft_delete(&self, id: SlotId) -> Result<(), RepositoryError>;
    fn fetch(&self, id: SlotId) -> Result<Option<ScheduleSlot>, RepositoryError>;
    fn fetch_by_number(
        &self,
        dormitory_id: DormitoryId,
        slot_number: u32,
    ) -> Result<Option<ScheduleSlot>, RepositoryError>;
    /// Non-deleted slots matching `filter`, ordered by dormitory then slot number.
    fn list(
        &self,
        filter: &ScheduleSlotFilter,
        pagination: Pagination,
    ) -> Result<Page<ScheduleSlot>, RepositoryError>;
}

/// Storage abstraction for class schedules.
pub trait ClassScheduleRepository: Send + Sync {
    fn insert(&self, schedule: ClassSchedule) -> Result<ClassSchedule, RepositoryError>;
    fn update(&self, schedule: ClassSchedule) -> Result<ClassSchedule, RepositoryError>;
    fn delete(&self, id: ClassScheduleId) -> Result<(), RepositoryError>;
    fn fetch(&self, id: ClassScheduleId) -> Result<Option<ClassSchedule>, RepositoryError>;
    fn list(
        &self,
        filter: &ClassScheduleFilter,
        pagination: Pagination,
    ) -> Result<Page<ClassSchedule>, RepositoryError>;
}
