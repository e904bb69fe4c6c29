//! Timetable facts: entries, enrollments and the joined entry view.

use chrono::{NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::catalog::{ClassroomId, FacultyId, SubjectId, TimeSlotId};
use super::term::Term;
use crate::define_id_type;

define_id_type!(EntryId);

/// One scheduled class: a faculty member teaching a subject section in a
/// classroom at a time slot during a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: EntryId,
    pub faculty_id: FacultyId,
    pub classroom_id: ClassroomId,
    pub slot_id: TimeSlotId,
    pub subject_id: SubjectId,
    pub section: String,
    pub term: Term,
    /// Soft-deleted entries have `is_active == false` and are ignored everywhere.
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Enrolled,
    Waitlisted,
    Dropped,
    Completed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::Waitlisted => "waitlisted",
            EnrollmentStatus::Dropped => "dropped",
            EnrollmentStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: i64,
    pub subject_id: SubjectId,
    pub section: String,
    pub term: Term,
    pub status: EnrollmentStatus,
}

/// An active entry joined with the display data needed for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDetail {
    pub entry_id: EntryId,
    pub faculty_id: FacultyId,
    pub faculty_name: String,
    pub classroom_id: ClassroomId,
    pub classroom_name: String,
    pub slot_id: TimeSlotId,
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub subject_id: SubjectId,
    pub subject_code: String,
    pub subject_name: String,
    pub section: String,
}

impl EntryDetail {
    /// e.g. `CS101 (Intro to Programming) section A`
    pub fn subject_label(&self) -> String {
        format!(
            "{} ({}) section {}",
            self.subject_code, self.subject_name, self.section
        )
    }
}
