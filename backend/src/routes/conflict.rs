use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{EntryDetail, EntryId};
use crate::services::error::EngineError;

// =========================================================
// Conflict check types
// =========================================================

/// Proposed assignment as submitted by the timetable editor.
///
/// Fields are raw so that malformed values reach the validator and are
/// reported as `InvalidArgument` instead of a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckRequest {
    pub faculty_id: i64,
    pub classroom_id: i64,
    pub slot_id: i64,
    pub semester: i64,
    pub academic_year: String,
    /// Entry being edited, exempt from conflicting with itself.
    #[serde(default)]
    pub exclude_entry_id: Option<i64>,
    #[serde(default)]
    pub subject_id: Option<i64>,
    #[serde(default)]
    pub section: Option<String>,
}

/// Display names of the requested resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictDetails {
    pub faculty_name: String,
    pub classroom_name: String,
    pub time_slot: String,
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Faculty,
    Classroom,
}

/// An existing entry that blocks the proposed assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub kind: ConflictKind,
    pub entry_id: EntryId,
    pub subject_code: String,
    pub subject_name: String,
    pub section: String,
    pub faculty_name: String,
    pub classroom_name: String,
}

impl ConflictRecord {
    pub fn from_entry(kind: ConflictKind, entry: &EntryDetail) -> Self {
        Self {
            kind,
            entry_id: entry.entry_id,
            subject_code: entry.subject_code.clone(),
            subject_name: entry.subject_name.clone(),
            section: entry.section.clone(),
            faculty_name: entry.faculty_name.clone(),
            classroom_name: entry.classroom_name.clone(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    CapacityExceeded,
    NearCapacity,
    HighOccupancy,
    RoomUnavailable,
    FacultyInactive,
}

impl WarningKind {
    pub fn severity(&self) -> Severity {
        match self {
            WarningKind::CapacityExceeded => Severity::Critical,
            WarningKind::NearCapacity | WarningKind::RoomUnavailable => Severity::High,
            WarningKind::HighOccupancy | WarningKind::FacultyInactive => Severity::Medium,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

/// Advisory, non-blocking signal attached to a conflict-free verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWarning {
    pub kind: WarningKind,
    pub severity: Severity,
    pub message: String,
}

impl ScheduleWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
        }
    }
}

/// Informational context for a conflict-free verdict.
///
/// `None` means the value could not be computed; an empty list means there
/// was nothing to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    pub classroom_capacity: u32,
    pub enrolled_students: Option<u32>,
    pub faculty_day_schedule: Option<Vec<EntryDetail>>,
    pub classroom_day_schedule: Option<Vec<EntryDetail>>,
    pub slot_popularity: Option<u32>,
}

/// Outcome of a conflict check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictVerdict {
    pub has_conflict: bool,
    pub message: String,
    pub details: Option<ConflictDetails>,
    pub conflicts: Vec<ConflictRecord>,
    pub warnings: Vec<ScheduleWarning>,
    pub additional_info: Option<AdditionalInfo>,
}

impl ConflictVerdict {
    /// Verdict reported when the check itself could not run: the assignment
    /// is treated as conflicting until it can be validated.
    pub fn fail_closed(err: &EngineError) -> Self {
        Self {
            has_conflict: true,
            message: format!(
                "Unable to verify this assignment; treating it as conflicting. {}",
                err
            ),
            details: None,
            conflicts: Vec::new(),
            warnings: Vec::new(),
            additional_info: None,
        }
    }
}

/// Route function name constant for conflict checks
pub const CHECK_CONFLICTS: &str = "check_conflicts";
