use super::domain::ScheduleTiming;
use super::repository::ScheduleSlotRepository;
use crate::error::ServiceError;
use crate::workflows::calendar::ClockValue;
use crate::workflows::ids::{DormitoryId, SlotId};

/// Resolves a class schedule's effective window.
///
/// A slot reference wins over explicit times: the slot must exist, be active,
/// and belong to `dormitory_id`. Without a slot both `start` and `end` are
/// required and `start` must come strictly before `end`.
pub fn resolve_timing<R>(
    slots: &R,
    dormitory_id: DormitoryId,
    slot_id: Option<SlotId>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<ScheduleTiming, ServiceError>
where
    R: ScheduleSlotRepository + ?Sized,
{
    if let Some(slot_id) = slot_id {
        let slot = slots
            .fetch(slot_id)?
            .filter(|slot| !slot.is_deleted())
            .ok_or(ServiceError::SlotNotFound)?;

        if !slot.active {
            return Err(ServiceError::SlotInactive);
        }
        if slot.dormitory_id != dormitory_id {
            return Err(ServiceError::bad_request(
                "schedule slot belongs to a different dormitory",
            ));
        }

        return Ok(ScheduleTiming {
            start_time: slot.start_time,
            end_time: slot.end_time,
            slot_id: Some(slot.id),
        });
    }

    let (Some(start), Some(end)) = (start, end) else {
        return Err(ServiceError::bad_request(
            "start_time and end_time are required when no slot is given",
        ));
    };

    let start = ClockValue::parse(start)?;
    let end = ClockValue::parse(end)?;
    if !start.is_before(end) {
        return Err(ServiceError::bad_request(
            "start_time must be before end_time",
        ));
    }

    // Both ends are read as wall-clock times in the start's offset.
    let end = end.aligned_to(start);
    let (start_time, end_time) = (start.time_of_day(), end.time_of_day());
    if start.spans_dates(end) || start_time >= end_time {
        return Err(ServiceError::bad_request(
            "class schedule window must not cross midnight",
        ));
    }

    Ok(ScheduleTiming {
        start_time,
        end_time,
        slot_id: None,
    })
}
