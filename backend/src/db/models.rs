//! Query filters and aggregate rows exchanged with the repository layer.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

pub use crate::models::{
    CapacityBand, Classroom, ClassroomId, Department, DepartmentId, Enrollment, EnrollmentStatus,
    EntryDetail, EntryId, Faculty, FacultyId, Subject, SubjectId, Term, TimeSlot, TimeSlotId,
    TimetableEntry,
};
pub use crate::services::window::ReportingWindow;

/// Filter for active timetable entries within one term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFilter {
    pub faculty_id: Option<FacultyId>,
    pub classroom_id: Option<ClassroomId>,
    pub slot_id: Option<TimeSlotId>,
    pub term: Term,
    /// Entry being edited; never reported as conflicting with itself.
    pub exclude_id: Option<EntryId>,
}

impl EntryFilter {
    pub fn new(term: Term) -> Self {
        Self {
            faculty_id: None,
            classroom_id: None,
            slot_id: None,
            term,
            exclude_id: None,
        }
    }

    pub fn with_faculty(mut self, faculty_id: FacultyId) -> Self {
        self.faculty_id = Some(faculty_id);
        self
    }

    pub fn with_classroom(mut self, classroom_id: ClassroomId) -> Self {
        self.classroom_id = Some(classroom_id);
        self
    }

    pub fn with_slot(mut self, slot_id: TimeSlotId) -> Self {
        self.slot_id = Some(slot_id);
        self
    }

    pub fn excluding(mut self, exclude_id: Option<EntryId>) -> Self {
        self.exclude_id = exclude_id;
        self
    }

    pub fn matches(&self, entry: &TimetableEntry) -> bool {
        entry.is_active
            && entry.term == self.term
            && self.faculty_id.is_none_or(|id| entry.faculty_id == id)
            && self.classroom_id.is_none_or(|id| entry.classroom_id == id)
            && self.slot_id.is_none_or(|id| entry.slot_id == id)
            && self.exclude_id != Some(entry.id)
    }
}

/// The resource a day-context query is scoped to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ResourceRef {
    Faculty(FacultyId),
    Classroom(ClassroomId),
}

impl ResourceRef {
    pub fn matches(&self, entry: &TimetableEntry) -> bool {
        match self {
            ResourceRef::Faculty(id) => entry.faculty_id == *id,
            ResourceRef::Classroom(id) => entry.classroom_id == *id,
        }
    }
}

/// Active entries of one resource on one weekday of a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayQuery {
    pub resource: ResourceRef,
    pub day: Weekday,
    pub term: Term,
    pub exclude_slot: Option<TimeSlotId>,
}

/// Facet filters over the active classroom population.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassroomFilter {
    pub building: Option<String>,
    pub floor: Option<i32>,
    pub department_id: Option<DepartmentId>,
    pub capacity_band: Option<CapacityBand>,
}

impl ClassroomFilter {
    /// Inactive rooms never match.
    pub fn matches(&self, room: &Classroom) -> bool {
        room.is_active
            && self
                .building
                .as_deref()
                .is_none_or(|b| room.building == b)
            && self.floor.is_none_or(|f| room.floor == f)
            && self
                .department_id
                .is_none_or(|d| room.department_id == Some(d))
            && self
                .capacity_band
                .is_none_or(|band| band.contains(room.capacity))
    }
}

/// Scope of the utilization aggregations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageFilter {
    pub rooms: ClassroomFilter,
    pub window: ReportingWindow,
    pub term: Option<Term>,
}

impl UsageFilter {
    /// Whether an entry contributes to utilization figures (room filter aside).
    pub fn includes_entry(&self, entry: &TimetableEntry) -> bool {
        entry.is_active
            && self.window.contains(entry.created_at.date())
            && self.term.is_none_or(|t| entry.term == t)
    }
}

/// Faculty, classroom and slot resolved together for a conflict check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAssignment {
    pub faculty: Faculty,
    pub classroom: Classroom,
    pub slot: TimeSlot,
}

/// One scheduled entry in a filtered room with its live enrollment count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOccupancyRow {
    pub entry_id: EntryId,
    pub classroom_id: ClassroomId,
    pub faculty_id: FacultyId,
    pub subject_id: SubjectId,
    pub day: Weekday,
    pub enrolled: u32,
}

/// Class count for one time slot, including slots with no classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUsageRow {
    pub slot_id: TimeSlotId,
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub class_count: u32,
    pub rooms_in_use: u32,
}

/// Raw per-department usage counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentUsageRow {
    pub department_id: DepartmentId,
    pub department_name: String,
    pub owned_classrooms: u32,
    pub total_classes: u32,
    pub own_room_usage: u32,
    pub external_room_usage: u32,
    /// Mean capacity of owned rooms, 0.0 when the department owns none.
    pub average_owned_capacity: f64,
    pub student_hours: u64,
}
