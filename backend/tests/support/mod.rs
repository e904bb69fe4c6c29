//! Shared fixtures for the integration tests.
//!
//! `campus()` builds a small, fully linked dataset:
//!
//! | id  | entity                                          |
//! |-----|-------------------------------------------------|
//! | 101 | Dr. Ada Lovelace (Computer Science, active)     |
//! | 102 | Dr. Alan Turing (Computer Science, active)      |
//! | 103 | Dr. Emmy Noether (Mathematics, on leave)        |
//! | 5   | R-105, Science, floor 1, 30 seats, CS-owned     |
//! | 7   | R-207, Science, floor 2, 60 seats, CS-owned     |
//! | 9   | M-101, Math Hall, floor 1, 120 seats, shared    |
//! | 11  | R-001, Science, inactive                        |
//!
//! Slot 1 is Monday 09:00-10:00. Dr. Lovelace teaches CS101 section A in
//! R-105 on slot 1 in semester 1 of 2025-2026 (entry 1).
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::collections::HashSet;
use std::sync::Mutex;

use timetable_engine::api::ConflictCheckRequest;
use timetable_engine::db::LocalRepository;
use timetable_engine::models::{
    Classroom, ClassroomId, Department, DepartmentId, Enrollment, EnrollmentStatus, EntryId,
    Faculty, FacultyId, FacultyStatus, RoomStatus, RoomType, Subject, SubjectId, Term, TimeSlot,
    TimeSlotId, TimetableEntry,
};

pub const AY: &str = "2025-2026";

pub fn term(semester: i64, academic_year: &str) -> Term {
    Term::parse(semester, academic_year).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(8, 0, 0).unwrap()
}

fn hm(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

pub fn department(id: i64, code: &str, name: &str) -> Department {
    Department {
        id: DepartmentId::new(id),
        code: code.to_string(),
        name: name.to_string(),
    }
}

pub fn faculty(id: i64, name: &str, department_id: i64, status: FacultyStatus) -> Faculty {
    Faculty {
        id: FacultyId::new(id),
        name: name.to_string(),
        department_id: DepartmentId::new(department_id),
        status,
    }
}

pub fn classroom(
    id: i64,
    room_number: &str,
    building: &str,
    floor: i32,
    capacity: u32,
    department_id: Option<i64>,
) -> Classroom {
    Classroom {
        id: ClassroomId::new(id),
        room_number: room_number.to_string(),
        building: building.to_string(),
        floor,
        capacity,
        room_type: RoomType::Lecture,
        department_id: department_id.map(DepartmentId::new),
        is_active: true,
        status: RoomStatus::Available,
    }
}

pub fn slot(id: i64, day: Weekday, start_hour: u32) -> TimeSlot {
    TimeSlot {
        id: TimeSlotId::new(id),
        day,
        start_time: hm(start_hour),
        end_time: hm(start_hour + 1),
    }
}

pub fn subject(id: i64, code: &str, name: &str, department_id: i64) -> Subject {
    Subject {
        id: SubjectId::new(id),
        code: code.to_string(),
        name: name.to_string(),
        department_id: DepartmentId::new(department_id),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn entry(
    id: i64,
    faculty_id: i64,
    classroom_id: i64,
    slot_id: i64,
    subject_id: i64,
    section: &str,
    term: Term,
    created_at: NaiveDateTime,
) -> TimetableEntry {
    TimetableEntry {
        id: EntryId::new(id),
        faculty_id: FacultyId::new(faculty_id),
        classroom_id: ClassroomId::new(classroom_id),
        slot_id: TimeSlotId::new(slot_id),
        subject_id: SubjectId::new(subject_id),
        section: section.to_string(),
        term,
        is_active: true,
        created_at,
    }
}

/// Enroll `count` students in a section, numbering them from `first_student`.
pub fn enroll(
    repo: &LocalRepository,
    subject_id: i64,
    section: &str,
    term: Term,
    first_student: i64,
    count: i64,
) {
    for student_id in first_student..first_student + count {
        repo.insert_enrollment(Enrollment {
            student_id,
            subject_id: SubjectId::new(subject_id),
            section: section.to_string(),
            term,
            status: EnrollmentStatus::Enrolled,
        });
    }
}

/// Catalog without any timetable entries.
pub fn catalog() -> LocalRepository {
    let repo = LocalRepository::new();
    repo.insert_department(department(1, "CS", "Computer Science"));
    repo.insert_department(department(2, "MA", "Mathematics"));

    repo.insert_faculty(faculty(101, "Dr. Ada Lovelace", 1, FacultyStatus::Active));
    repo.insert_faculty(faculty(102, "Dr. Alan Turing", 1, FacultyStatus::Active));
    repo.insert_faculty(faculty(103, "Dr. Emmy Noether", 2, FacultyStatus::OnLeave));

    repo.insert_classroom(classroom(5, "R-105", "Science", 1, 30, Some(1)));
    repo.insert_classroom(classroom(7, "R-207", "Science", 2, 60, Some(1)));
    repo.insert_classroom(classroom(9, "M-101", "Math Hall", 1, 120, None));
    let mut closed = classroom(11, "R-001", "Science", 0, 40, Some(1));
    closed.is_active = false;
    repo.insert_classroom(closed);

    repo.insert_time_slot(slot(1, Weekday::Mon, 9));
    repo.insert_time_slot(slot(2, Weekday::Mon, 10));
    repo.insert_time_slot(slot(3, Weekday::Tue, 9));
    repo.insert_time_slot(slot(4, Weekday::Wed, 14));

    repo.insert_subject(subject(201, "CS101", "Intro to Programming", 1));
    repo.insert_subject(subject(202, "CS205", "Data Structures", 1));
    repo.insert_subject(subject(301, "MA201", "Linear Algebra", 2));
    repo
}

/// Catalog plus Dr. Lovelace's Monday 09:00 class in R-105.
pub fn campus() -> LocalRepository {
    let repo = catalog();
    let t = term(1, AY);
    repo.insert_entry(entry(1, 101, 5, 1, 201, "A", t, at(2025, 9, 1)));
    enroll(&repo, 201, "A", t, 1, 20);
    repo
}

pub fn request(faculty_id: i64, classroom_id: i64, slot_id: i64, academic_year: &str) -> ConflictCheckRequest {
    ConflictCheckRequest {
        faculty_id,
        classroom_id,
        slot_id,
        semester: 1,
        academic_year: academic_year.to_string(),
        exclude_entry_id: None,
        subject_id: None,
        section: None,
    }
}

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}
