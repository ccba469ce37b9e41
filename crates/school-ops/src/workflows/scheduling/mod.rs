//! Schedule slots, class schedules, and the timing rules that bind them.

pub mod class_schedules;
pub mod domain;
pub mod repository;
pub mod router;
pub mod slots;
pub mod timing;

#[cfg(test)]
mod tests;

pub use class_schedules::ClassScheduleService;
pub use domain::{
    ClassSchedule, ClassScheduleChanges, ClassScheduleDraft, ClassScheduleFilter,
    NewScheduleSlot, ScheduleSlot, ScheduleSlotFilter, ScheduleSlotUpdate, ScheduleTiming,
};
pub use repository::{ClassScheduleRepository, ScheduleSlotRepository};
pub use router::scheduling_router;
pub use slots::ScheduleSlotService;
pub use timing::resolve_timing;
