use chrono::{NaiveDateTime, NaiveTime, Weekday};
use diesel::prelude::*;
use serde::de::DeserializeOwned;

use super::schema::{classrooms, departments, faculty, subjects, time_slots, timetable_entries};
use crate::db::models::{
    Classroom, ClassroomId, Department, DepartmentId, EntryDetail, EntryId, Faculty, FacultyId,
    Subject, SubjectId, Term, TimeSlot, TimeSlotId, TimetableEntry,
};
use crate::db::repository::{RepositoryError, RepositoryResult};

/// Decode a text enum column through the type's serde representation.
fn parse_text_enum<T: DeserializeOwned>(column: &str, value: &str) -> RepositoryResult<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).map_err(|_| {
        RepositoryError::validation(format!("Unexpected value '{}' in column {}", value, column))
    })
}

pub fn weekday_from_db(value: i16) -> RepositoryResult<Weekday> {
    u8::try_from(value)
        .ok()
        .and_then(|v| Weekday::try_from(v).ok())
        .ok_or_else(|| {
            RepositoryError::validation(format!("Invalid day_of_week {} in time_slots", value))
        })
}

pub fn weekday_to_db(day: Weekday) -> i16 {
    day.num_days_from_monday() as i16
}

pub fn term_from_db(semester: i32, academic_year: &str) -> RepositoryResult<Term> {
    Term::parse(i64::from(semester), academic_year)
        .map_err(|e| RepositoryError::validation(format!("Invalid stored term: {}", e)))
}

/// Semester and academic year as stored in the term columns.
pub fn term_to_db(term: &Term) -> (i32, String) {
    (
        i32::try_from(term.semester.value()).unwrap_or(i32::MAX),
        term.academic_year.to_string(),
    )
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = departments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DepartmentRow {
    pub id: i64,
    pub code: String,
    pub name: String,
}

impl From<DepartmentRow> for Department {
    fn from(row: DepartmentRow) -> Self {
        Department {
            id: DepartmentId::new(row.id),
            code: row.code,
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = faculty)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FacultyRow {
    pub id: i64,
    pub name: String,
    pub department_id: i64,
    pub status: String,
}

impl FacultyRow {
    pub fn into_domain(self) -> RepositoryResult<Faculty> {
        Ok(Faculty {
            id: FacultyId::new(self.id),
            name: self.name,
            department_id: DepartmentId::new(self.department_id),
            status: parse_text_enum("faculty.status", &self.status)?,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = classrooms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ClassroomRow {
    pub id: i64,
    pub room_number: String,
    pub building: String,
    pub floor: i32,
    pub capacity: i32,
    pub room_type: String,
    pub department_id: Option<i64>,
    pub is_active: bool,
    pub status: String,
}

impl ClassroomRow {
    pub fn into_domain(self) -> RepositoryResult<Classroom> {
        let capacity = u32::try_from(self.capacity).map_err(|_| {
            RepositoryError::validation(format!(
                "Negative capacity {} for classroom {}",
                self.capacity, self.id
            ))
        })?;
        Ok(Classroom {
            id: ClassroomId::new(self.id),
            room_number: self.room_number,
            building: self.building,
            floor: self.floor,
            capacity,
            room_type: parse_text_enum("classrooms.room_type", &self.room_type)?,
            department_id: self.department_id.map(DepartmentId::new),
            is_active: self.is_active,
            status: parse_text_enum("classrooms.status", &self.status)?,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = time_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TimeSlotRow {
    pub id: i64,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TimeSlotRow {
    pub fn into_domain(self) -> RepositoryResult<TimeSlot> {
        Ok(TimeSlot {
            id: TimeSlotId::new(self.id),
            day: weekday_from_db(self.day_of_week)?,
            start_time: self.start_time,
            end_time: self.end_time,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subjects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubjectRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub department_id: i64,
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        Subject {
            id: SubjectId::new(row.id),
            code: row.code,
            name: row.name,
            department_id: DepartmentId::new(row.department_id),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = timetable_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EntryRow {
    pub id: i64,
    pub faculty_id: i64,
    pub classroom_id: i64,
    pub slot_id: i64,
    pub subject_id: i64,
    pub section: String,
    pub semester: i32,
    pub academic_year: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl EntryRow {
    pub fn into_domain(self) -> RepositoryResult<TimetableEntry> {
        Ok(TimetableEntry {
            id: EntryId::new(self.id),
            faculty_id: FacultyId::new(self.faculty_id),
            classroom_id: ClassroomId::new(self.classroom_id),
            slot_id: TimeSlotId::new(self.slot_id),
            subject_id: SubjectId::new(self.subject_id),
            term: term_from_db(self.semester, &self.academic_year)?,
            section: self.section,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

/// Row of the entry / faculty / classroom / slot / subject join.
pub type EntryJoinRow = (EntryRow, FacultyRow, ClassroomRow, TimeSlotRow, SubjectRow);

pub fn entry_detail(row: EntryJoinRow) -> RepositoryResult<EntryDetail> {
    let (entry, faculty, classroom, slot, subject) = row;
    let classroom = classroom.into_domain()?;
    let slot = slot.into_domain()?;
    Ok(EntryDetail {
        entry_id: EntryId::new(entry.id),
        faculty_id: FacultyId::new(faculty.id),
        faculty_name: faculty.name,
        classroom_id: classroom.id,
        classroom_name: classroom.display_name(),
        slot_id: slot.id,
        day: slot.day,
        start_time: slot.start_time,
        end_time: slot.end_time,
        subject_id: SubjectId::new(subject.id),
        subject_code: subject.code,
        subject_name: subject.name,
        section: entry.section,
    })
}
