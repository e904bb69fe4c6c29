//! Public API surface of the engine.
//!
//! This file consolidates the request and response types of the conflict
//! validator and the utilization analyzer. All types derive
//! Serialize/Deserialize for JSON serialization.

pub use crate::routes::conflict::AdditionalInfo;
pub use crate::routes::conflict::ConflictCheckRequest;
pub use crate::routes::conflict::ConflictDetails;
pub use crate::routes::conflict::ConflictKind;
pub use crate::routes::conflict::ConflictRecord;
pub use crate::routes::conflict::ConflictVerdict;
pub use crate::routes::conflict::ScheduleWarning;
pub use crate::routes::conflict::Severity;
pub use crate::routes::conflict::WarningKind;
pub use crate::routes::utilization::DepartmentUtilization;
pub use crate::routes::utilization::PeakHourRow;
pub use crate::routes::utilization::Recommendation;
pub use crate::routes::utilization::ReportSection;
pub use crate::routes::utilization::RoomUtilization;
pub use crate::routes::utilization::UnderutilizedRoom;
pub use crate::routes::utilization::UsageLevel;
pub use crate::routes::utilization::UtilizationReport;
pub use crate::routes::utilization::UtilizationStatus;
pub use crate::routes::utilization::UtilizationSummary;
pub use crate::routes::utilization::WeeklyTrendRow;

pub use crate::models::{
    AcademicYear, CapacityBand, Classroom, ClassroomId, Department, DepartmentId, EntryDetail,
    EntryId, Faculty, FacultyId, Semester, SubjectId, Term, TimeSlot, TimeSlotId,
};
pub use crate::services::window::{ReportingPeriod, ReportingWindow};
