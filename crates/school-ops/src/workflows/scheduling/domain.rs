use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::calendar::DayOfWeek;
use crate::workflows::ids::{ClassId, ClassScheduleId, DormitoryId, SlotId, SubjectId, TeacherId};
use crate::workflows::interval;

/// Numbered, recurring time-of-day window owned by a dormitory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub id: SlotId,
    pub dormitory_id: DormitoryId,
    pub slot_number: u32,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ScheduleSlot {
    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        interval::overlaps(self.start_time, self.end_time, start, end)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Input for creating a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScheduleSlot {
    pub dormitory_id: DormitoryId,
    pub slot_number: u32,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// Partial slot update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlotUpdate {
    #[serde(default)]
    pub slot_number: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ScheduleSlotFilter {
    #[serde(default)]
    pub dormitory_id: Option<DormitoryId>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ScheduleSlotFilter {
    pub fn dormitory(dormitory_id: DormitoryId) -> Self {
        Self {
            dormitory_id: Some(dormitory_id),
            active: None,
        }
    }

    pub fn matches(&self, slot: &ScheduleSlot) -> bool {
        !slot.is_deleted()
            && self.dormitory_id.map_or(true, |id| slot.dormitory_id == id)
            && self.active.map_or(true, |active| slot.active == active)
    }
}

/// Effective time window of a class schedule together with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTiming {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Present when the window is derived from a slot.
    pub slot_id: Option<SlotId>,
}

impl ScheduleTiming {
    pub fn is_slot_bound(&self) -> bool {
        self.slot_id.is_some()
    }
}

/// Recurring class meeting: a class, a teacher, and a weekday bound to a slot
/// or to an explicit window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSchedule {
    pub id: ClassScheduleId,
    pub class_id: ClassId,
    pub teacher_id: TeacherId,
    pub dormitory_id: DormitoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<SubjectId>,
    pub day_of_week: DayOfWeek,
    pub timing: ScheduleTiming,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied schedule payload; timing fields are raw so the resolver
/// can report malformed input as a bad request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassScheduleDraft {
    pub class_id: String,
    pub teacher_id: String,
    pub dormitory_id: String,
    #[serde(default)]
    pub subject_id: Option<String>,
    pub day_of_week: String,
    #[serde(default)]
    pub slot_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// Partial schedule update. Timing is re-resolved only when `slot_id` or an
/// explicit time is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassScheduleChanges {
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub dormitory_id: Option<String>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub day_of_week: Option<String>,
    #[serde(default)]
    pub slot_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl ClassScheduleChanges {
    pub fn touches_timing(&self) -> bool {
        self.slot_id.is_some() || self.start_time.is_some() || self.end_time.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ClassScheduleFilter {
    #[serde(default)]
    pub class_id: Option<ClassId>,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub dormitory_id: Option<DormitoryId>,
    #[serde(default)]
    pub day_of_week: Option<DayOfWeek>,
}

impl ClassScheduleFilter {
    pub fn matches(&self, schedule: &ClassSchedule) -> bool {
        self.class_id.map_or(true, |id| schedule.class_id == id)
            && self.teacher_id.map_or(true, |id| schedule.teacher_id == id)
            && self.dormitory_id.map_or(true, |id| schedule.dormitory_id == id)
            && self
                .day_of_week
                .map_or(true, |day| schedule.day_of_week == day)
    }
}
