use super::common::*;
use crate::error::ServiceError;
use crate::store::PageRequest;
use crate::workflows::attendance::{
    OpenSessionsRequest, SessionFilter, SessionStatus, StudentAttendanceStatus,
    TeacherAttendanceStatus, TeacherSubmission,
};
use crate::workflows::ids::{ClassScheduleId, SessionId, StudentId, TeacherId};

fn open_request(on: &str, ids: &[ClassScheduleId]) -> OpenSessionsRequest {
    OpenSessionsRequest {
        date: on.to_string(),
        class_schedule_ids: ids.iter().map(ToString::to_string).collect(),
    }
}

#[test]
fn open_copies_schedule_teacher_and_window() {
    let h = harness();
    let schedule = h.schedule();

    let outcome = h
        .attendance
        .open_sessions(open_request("2025-11-01", &[schedule.id]))
        .expect("opened");

    assert_eq!(outcome.created.len(), 1);
    let session = &outcome.created[0];
    assert_eq!(session.class_schedule_id, schedule.id);
    assert_eq!(session.teacher_id, schedule.teacher_id);
    assert_eq!(session.start_time, Some(schedule.timing.start_time));
    assert_eq!(session.end_time, Some(schedule.timing.end_time));
    assert_eq!(session.status, SessionStatus::Open);
    assert_eq!(session.date, date("2025-11-01"));
}

#[test]
fn opening_twice_is_a_no_op() {
    let h = harness();
    let schedule = h.schedule();

    h.attendance
        .open_sessions(open_request("2025-11-01", &[schedule.id]))
        .expect("first open");
    let second = h
        .attendance
        .open_sessions(open_request("2025-11-01", &[schedule.id]))
        .expect("second open");

    assert!(second.created.is_empty());
    assert_eq!(second.skipped, vec![schedule.id]);

    let sessions = h
        .attendance
        .list(&SessionFilter::default(), PageRequest::default())
        .expect("listing");
    assert_eq!(sessions.total, 1);
}

#[test]
fn concurrent_opens_create_a_single_session() {
    let h = harness();
    let schedule = h.schedule();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let attendance = h.attendance.clone();
            let request = open_request("2025-11-01", &[schedule.id]);
            std::thread::spawn(move || attendance.open_sessions(request))
        })
        .collect();

    let created: usize = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker").expect("opened"))
        .map(|outcome| outcome.created.len())
        .sum();

    assert_eq!(created, 1);
}

#[test]
fn open_validates_everything_before_writing() {
    let h = harness();
    let schedule = h.schedule();

    let err = h
        .attendance
        .open_sessions(open_request("2025-11-01", &[schedule.id, ClassScheduleId::new()]))
        .expect_err("unknown schedule");
    assert!(matches!(err, ServiceError::ClassScheduleNotFound));

    let err = h
        .attendance
        .open_sessions(open_request("01/11/2025", &[schedule.id]))
        .expect_err("bad date");
    assert!(matches!(err, ServiceError::BadRequest(_)));

    let sessions = h
        .attendance
        .list(&SessionFilter::default(), PageRequest::default())
        .expect("listing");
    assert_eq!(sessions.total, 0);
}

#[test]
fn submission_requires_an_existing_open_session_and_records() {
    let h = harness();
    let schedule = h.schedule();
    let session = h.open(&schedule, "2025-11-01");

    let err = h
        .attendance
        .submit_students(SessionId::new(), submission(vec![entry(StudentId::new(), "present")]))
        .expect_err("unknown session");
    assert!(matches!(err, ServiceError::AttendanceSessionNotFound));

    let err = h
        .attendance
        .submit_students(session, submission(Vec::new()))
        .expect_err("empty batch");
    assert!(matches!(err, ServiceError::BadRequest(_)));

    let err = h
        .attendance
        .submit_students(
            session,
            submission(vec![
                entry(StudentId::new(), "present"),
                entry(StudentId::new(), "late"),
            ]),
        )
        .expect_err("bad token");
    assert!(matches!(err, ServiceError::BadRequest(_)));
    assert!(h.attendance.get(session).expect("detail").students.is_empty());
}

#[test]
fn resubmission_overwrites_per_student() {
    let h = harness();
    let schedule = h.schedule();
    let session = h.open(&schedule, "2025-11-01");
    let student = StudentId::new();

    h.attendance
        .submit_students(session, submission(vec![entry(student, "absent")]))
        .expect("first");
    h.attendance
        .submit_students(session, submission(vec![entry(student, "present")]))
        .expect("second");

    let detail = h.attendance.get(session).expect("detail");
    assert_eq!(detail.students.len(), 1);
    assert_eq!(detail.students[0].status, StudentAttendanceStatus::Present);
}

#[test]
fn teacher_submission_defaults_to_session_teacher() {
    let h = harness();
    let schedule = h.schedule();
    let session = h.open(&schedule, "2025-11-01");

    let record = h
        .attendance
        .submit_teacher(
            session,
            TeacherSubmission {
                teacher_id: None,
                status: "present".to_string(),
            },
        )
        .expect("teacher recorded");
    assert_eq!(record.teacher_id, schedule.teacher_id);
    assert_eq!(record.status, TeacherAttendanceStatus::Present);

    let err = h
        .attendance
        .submit_teacher(
            session,
            TeacherSubmission {
                teacher_id: None,
                status: "sick".to_string(),
            },
        )
        .expect_err("students only");
    assert!(matches!(err, ServiceError::BadRequest(_)));

    let detail = h.attendance.get(session).expect("detail");
    assert_eq!(detail.teacher.map(|t| t.teacher_id), Some(schedule.teacher_id));
}

#[test]
fn substitute_does_not_displace_scheduled_teacher_in_detail() {
    let h = harness();
    let schedule = h.schedule();
    let session = h.open(&schedule, "2025-11-01");

    h.attendance
        .submit_teacher(
            session,
            TeacherSubmission {
                teacher_id: None,
                status: "absent".to_string(),
            },
        )
        .expect("scheduled teacher");
    let substitute = TeacherId::new();
    h.attendance
        .submit_teacher(
            session,
            TeacherSubmission {
                teacher_id: Some(substitute.to_string()),
                status: "present".to_string(),
            },
        )
        .expect("substitute");

    for _ in 0..20 {
        let teacher = h.attendance.get(session).expect("detail").teacher;
        let teacher = teacher.expect("teacher recorded");
        assert_eq!(teacher.teacher_id, schedule.teacher_id);
        assert_eq!(teacher.status, TeacherAttendanceStatus::Absent);
    }
}

#[test]
fn substitute_alone_is_reported() {
    let h = harness();
    let schedule = h.schedule();
    let session = h.open(&schedule, "2025-11-01");
    let substitute = TeacherId::new();

    h.attendance
        .submit_teacher(
            session,
            TeacherSubmission {
                teacher_id: Some(substitute.to_string()),
                status: "present".to_string(),
            },
        )
        .expect("substitute");

    let detail = h.attendance.get(session).expect("detail");
    assert_eq!(detail.teacher.map(|t| t.teacher_id), Some(substitute));
}

#[test]
fn repeated_student_in_one_batch_keeps_the_last_entry() {
    let h = harness();
    let schedule = h.schedule();
    let session = h.open(&schedule, "2025-11-01");
    let repeated = StudentId::new();
    let other = StudentId::new();

    let saved = h
        .attendance
        .submit_students(
            session,
            submission(vec![
                entry(repeated, "present"),
                entry(other, "present"),
                entry(repeated, "absent"),
            ]),
        )
        .expect("submitted");

    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].student_id, repeated);
    assert_eq!(saved[0].status, StudentAttendanceStatus::Absent);
    assert_eq!(saved[1].student_id, other);

    let stored = h.attendance.get(session).expect("detail").students;
    assert_eq!(stored.len(), 2);
    let entries = h.audit.entries();
    let submitted = entries
        .iter()
        .find(|entry| entry.action == "submit_students")
        .expect("audited");
    assert_eq!(submitted.metadata.get("records").map(String::as_str), Some("2"));
}

#[test]
fn locked_sessions_reject_every_submission() {
    let h = harness();
    let schedule = h.schedule();
    let session = h.open(&schedule, "2025-11-01");

    let outcome = h
        .attendance
        .lock_sessions_for_date("2025-11-01")
        .expect("locked");
    assert_eq!(outcome.locked, 1);

    let err = h
        .attendance
        .submit_students(session, submission(vec![entry(StudentId::new(), "present")]))
        .expect_err("locked");
    assert!(matches!(err, ServiceError::AttendanceAlreadyLocked));

    let err = h
        .attendance
        .submit_students(session, submission(Vec::new()))
        .expect_err("locked wins over empty payload");
    assert!(matches!(err, ServiceError::AttendanceAlreadyLocked));

    let err = h
        .attendance
        .submit_teacher(
            session,
            TeacherSubmission {
                teacher_id: Some(TeacherId::new().to_string()),
                status: "absent".to_string(),
            },
        )
        .expect_err("locked");
    assert!(matches!(err, ServiceError::AttendanceAlreadyLocked));
}

#[test]
fn locking_is_scoped_to_the_date_and_blocks_reopening() {
    let h = harness();
    let schedule = h.schedule();
    h.open(&schedule, "2025-11-01");
    let next_day = h.open(&schedule, "2025-11-02");

    h.attendance
        .lock_sessions_for_date("2025-11-01")
        .expect("locked");

    let detail = h.attendance.get(next_day).expect("detail");
    assert_eq!(detail.session.status, SessionStatus::Open);

    let reopened = h
        .attendance
        .open_sessions(open_request("2025-11-01", &[schedule.id]))
        .expect("open again");
    assert!(reopened.created.is_empty());

    let locked = h
        .attendance
        .list(
            &SessionFilter {
                status: Some(SessionStatus::Locked),
                ..SessionFilter::default()
            },
            PageRequest::default(),
        )
        .expect("listing");
    assert_eq!(locked.total, 1);
}

#[test]
fn list_clamps_page_size() {
    let h = harness();
    let schedule = h.schedule();
    for day in 1..=3 {
        h.open(&schedule, &format!("2025-11-0{day}"));
    }

    let page = h
        .attendance
        .list(
            &SessionFilter {
                class_schedule_id: Some(schedule.id),
                ..SessionFilter::default()
            },
            PageRequest {
                page: Some(0),
                page_size: Some(1_000),
            },
        )
        .expect("listing");

    assert_eq!(page.page, 1);
    assert_eq!(page.page_size, 100);
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.items[0].date, date("2025-11-03"));
}

#[test]
fn lifecycle_is_audited() {
    let h = harness();
    let schedule = h.schedule();
    let session = h.open(&schedule, "2025-11-01");
    h.attendance
        .submit_students(session, submission(vec![entry(StudentId::new(), "present")]))
        .expect("submitted");
    h.attendance
        .lock_sessions_for_date("2025-11-01")
        .expect("locked");

    assert_eq!(
        h.audit.actions(),
        vec![
            ("attendance_session", "open"),
            ("attendance_session", "submit_students"),
            ("attendance_session", "lock"),
        ]
    );
}
