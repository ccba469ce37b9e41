use crate::infra::{parse_date, Services};
use chrono::{Local, NaiveDate};
use clap::Args;
use school_ops::audit::MemoryAuditSink;
use school_ops::error::AppError;
use school_ops::store::PaginationConfig;
use school_ops::workflows::attendance::{
    OpenSessionsRequest, StudentAttendanceEntry, StudentSubmission, TeacherSubmission,
};
use school_ops::workflows::calendar::{ClockValue, DayOfWeek};
use school_ops::workflows::health::HealthStatusRequest;
use school_ops::workflows::ids::{ClassId, DormitoryId, StudentId, TeacherId, UserId};
use school_ops::workflows::leave::LeavePermitRequest;
use school_ops::workflows::scheduling::{ClassScheduleDraft, NewScheduleSlot};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// School day to simulate (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let audit = Arc::new(MemoryAuditSink::default());
    let services = Services::in_memory(audit.clone(), PaginationConfig::default());

    println!("=== School day {date} ({}) ===", DayOfWeek::of(date));

    println!("\n-- Dormitory slots --");
    let dormitory = DormitoryId::new();
    let first = services
        .slots
        .create(slot(dormitory, 1, "08:00", "09:00")?)?;
    println!(
        "created slot #{} {}-{}",
        first.slot_number, first.start_time, first.end_time
    );
    match services.slots.create(slot(dormitory, 2, "08:30", "09:30")?) {
        Ok(_) => println!("unexpected: overlapping slot accepted"),
        Err(err) => println!("rejected slot #2 08:30-09:30: {err}"),
    }
    let second = services
        .slots
        .create(slot(dormitory, 2, "09:00", "10:00")?)?;
    println!(
        "created slot #{} {}-{} (touching slots do not overlap)",
        second.slot_number, second.start_time, second.end_time
    );

    println!("\n-- Class schedule --");
    let teacher = TeacherId::new();
    let schedule = services.schedules.create(ClassScheduleDraft {
        class_id: ClassId::new().to_string(),
        teacher_id: teacher.to_string(),
        dormitory_id: dormitory.to_string(),
        subject_id: None,
        day_of_week: DayOfWeek::of(date).to_string(),
        slot_id: Some(first.id.to_string()),
        start_time: Some("13:00".to_string()),
        end_time: Some("14:00".to_string()),
    })?;
    println!(
        "schedule {} runs {}-{} (slot times win over explicit times)",
        schedule.id, schedule.timing.start_time, schedule.timing.end_time
    );

    println!("\n-- Leave and medical records --");
    let on_leave = StudentId::new();
    let sick = StudentId::new();
    let present = StudentId::new();
    let staff = UserId::new();

    let permit = services.leave.create(LeavePermitRequest {
        student_id: on_leave.to_string(),
        leave_type: "home_leave".to_string(),
        reason: "Family visit".to_string(),
        start_date: date.to_string(),
        end_date: date.to_string(),
        created_by: staff.to_string(),
    })?;
    let permit = services.leave.approve(permit.id, staff)?;
    println!("permit {} is {}", permit.id, permit.status.label());

    let exemption = services.health.create(HealthStatusRequest {
        student_id: sick.to_string(),
        diagnosis: "Influenza".to_string(),
        notes: String::new(),
        start_date: date.to_string(),
        end_date: None,
        created_by: staff.to_string(),
    })?;
    println!("medical exemption {} is {}", exemption.id, exemption.status.label());

    println!("\n-- Attendance session --");
    let request = OpenSessionsRequest {
        date: date.to_string(),
        class_schedule_ids: vec![schedule.id.to_string()],
    };
    let opened = services.attendance.open_sessions(request.clone())?;
    let again = services.attendance.open_sessions(request)?;
    println!(
        "opened {} session(s); reopening skipped {}",
        opened.created.len(),
        again.skipped.len()
    );
    let Some(session) = opened.created.first() else {
        println!("no session was opened, stopping");
        return Ok(());
    };

    let submission = StudentSubmission {
        records: [on_leave, sick, present]
            .iter()
            .map(|student| StudentAttendanceEntry {
                student_id: student.to_string(),
                status: "present".to_string(),
                note: None,
            })
            .collect(),
    };
    for record in services.attendance.submit_students(session.id, submission)? {
        let who = if record.student_id == on_leave {
            "on leave"
        } else if record.student_id == sick {
            "sick"
        } else {
            "in class"
        };
        println!("student {who:<9} submitted present, recorded {}", record.status.label());
    }
    let teacher_record = services.attendance.submit_teacher(
        session.id,
        TeacherSubmission {
            teacher_id: None,
            status: "present".to_string(),
        },
    )?;
    println!("teacher recorded {}", teacher_record.status.label());

    let locked = services
        .attendance
        .lock_sessions_for_date(&date.to_string())?;
    println!("locked {} session(s) for {}", locked.locked, locked.date);
    let late = services.attendance.submit_teacher(
        session.id,
        TeacherSubmission {
            teacher_id: None,
            status: "absent".to_string(),
        },
    );
    if let Err(err) = late {
        println!("late correction rejected: {err}");
    }

    println!("\n-- Audit trail --");
    for (resource, action) in audit.actions() {
        println!("{resource}:{action}");
    }

    Ok(())
}

fn slot(
    dormitory_id: DormitoryId,
    slot_number: u32,
    start: &str,
    end: &str,
) -> Result<NewScheduleSlot, AppError> {
    Ok(NewScheduleSlot {
        dormitory_id,
        slot_number,
        name: format!("Period {slot_number}"),
        start_time: ClockValue::parse(start)?.time_of_day(),
        end_time: ClockValue::parse(end)?.time_of_day(),
        active: true,
    })
}
