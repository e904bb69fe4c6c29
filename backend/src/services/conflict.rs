//! Conflict validation of a single proposed timetable assignment.
//!
//! A proposed (faculty, classroom, slot, term) tuple is legal when no other
//! active entry of the same term already holds the faculty member or the
//! classroom in that slot. The conflict queries decide the verdict; every
//! other query here only enriches a conflict-free verdict and degrades to
//! `None` when it fails.

use log::{debug, info, warn};

use crate::api::{
    AdditionalInfo, ConflictCheckRequest, ConflictDetails, ConflictKind, ConflictRecord,
    ConflictVerdict, ScheduleWarning, WarningKind,
};
use crate::db::models::{
    ClassroomId, DayQuery, EnrollmentStatus, EntryDetail, EntryFilter, EntryId, FacultyId,
    ResolvedAssignment, ResourceRef, SubjectId, Term, TimeSlotId,
};
use crate::db::repository::{CatalogRepository, RepositoryError, TimetableRepository};
use crate::models::{FacultyStatus, RoomStatus};
use crate::services::error::{advisory, EngineError, EngineResult, ResourceKind};

/// Validated form of a [`ConflictCheckRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictQuery {
    pub faculty_id: FacultyId,
    pub classroom_id: ClassroomId,
    pub slot_id: TimeSlotId,
    pub term: Term,
    pub exclude_entry_id: Option<EntryId>,
    /// Subject section whose enrollment is compared with the room capacity.
    pub section: Option<(SubjectId, String)>,
}

fn positive_id(field: &'static str, value: i64) -> EngineResult<i64> {
    if value > 0 {
        Ok(value)
    } else {
        Err(EngineError::invalid(
            field,
            format!("must be a positive integer, got {}", value),
        ))
    }
}

impl ConflictQuery {
    pub fn from_request(request: &ConflictCheckRequest) -> EngineResult<Self> {
        let faculty_id = FacultyId::new(positive_id("faculty_id", request.faculty_id)?);
        let classroom_id = ClassroomId::new(positive_id("classroom_id", request.classroom_id)?);
        let slot_id = TimeSlotId::new(positive_id("slot_id", request.slot_id)?);
        let term = Term::parse(request.semester, &request.academic_year)?;

        let exclude_entry_id = request
            .exclude_entry_id
            .map(|id| positive_id("exclude_entry_id", id).map(EntryId::new))
            .transpose()?;

        let section = match (request.subject_id, request.section.as_deref()) {
            (None, None) => None,
            (Some(subject_id), Some(section)) => {
                let subject_id = SubjectId::new(positive_id("subject_id", subject_id)?);
                let section = section.trim();
                if section.is_empty() {
                    return Err(EngineError::invalid("section", "must not be empty"));
                }
                Some((subject_id, section.to_string()))
            }
            (Some(_), None) => {
                return Err(EngineError::invalid(
                    "section",
                    "is required when subject_id is given",
                ))
            }
            (None, Some(_)) => {
                return Err(EngineError::invalid(
                    "subject_id",
                    "is required when section is given",
                ))
            }
        };

        Ok(Self {
            faculty_id,
            classroom_id,
            slot_id,
            term,
            exclude_entry_id,
            section,
        })
    }

    fn filter(&self) -> EntryFilter {
        EntryFilter::new(self.term)
            .with_slot(self.slot_id)
            .excluding(self.exclude_entry_id)
    }
}

/// Capacity warning for an enrollment count, most severe threshold first.
///
/// Thresholds are strict: above capacity, above 90% and above 80%.
pub fn capacity_warning(enrolled: u32, capacity: u32) -> Option<WarningKind> {
    let scaled = u64::from(enrolled) * 10;
    let capacity = u64::from(capacity);
    if u64::from(enrolled) > capacity {
        Some(WarningKind::CapacityExceeded)
    } else if scaled > capacity * 9 {
        Some(WarningKind::NearCapacity)
    } else if scaled > capacity * 8 {
        Some(WarningKind::HighOccupancy)
    } else {
        None
    }
}

fn capacity_message(kind: WarningKind, enrolled: u32, capacity: u32) -> String {
    match kind {
        WarningKind::CapacityExceeded => format!(
            "Enrolled students ({}) exceed the classroom capacity ({})",
            enrolled, capacity
        ),
        WarningKind::NearCapacity => format!(
            "Enrolled students ({}) exceed 90% of the classroom capacity ({})",
            enrolled, capacity
        ),
        _ => format!(
            "Enrolled students ({}) exceed 80% of the classroom capacity ({})",
            enrolled, capacity
        ),
    }
}

/// Warnings derived from the resolved resources themselves.
fn status_warnings(resolved: &ResolvedAssignment) -> Vec<ScheduleWarning> {
    let mut warnings = Vec::new();
    let room = &resolved.classroom;
    if !room.is_active {
        warnings.push(ScheduleWarning::new(
            WarningKind::RoomUnavailable,
            format!("Classroom {} is inactive", room.display_name()),
        ));
    } else if room.status != RoomStatus::Available {
        warnings.push(ScheduleWarning::new(
            WarningKind::RoomUnavailable,
            format!(
                "Classroom {} is currently {}",
                room.display_name(),
                room.status.as_str()
            ),
        ));
    }
    let faculty = &resolved.faculty;
    if faculty.status != FacultyStatus::Active {
        warnings.push(ScheduleWarning::new(
            WarningKind::FacultyInactive,
            format!(
                "Faculty {} is {}",
                faculty.name,
                faculty.status.as_str().replace('_', " ")
            ),
        ));
    }
    warnings
}

fn conflict_message(
    resolved: &ResolvedAssignment,
    faculty_conflicts: &[EntryDetail],
    classroom_conflicts: &[EntryDetail],
) -> String {
    let slot = resolved.slot.label();
    let mut parts = Vec::new();
    for entry in faculty_conflicts {
        parts.push(format!(
            "Faculty conflict: {} is already teaching {} in {} on {}.",
            resolved.faculty.name,
            entry.subject_label(),
            entry.classroom_name,
            slot
        ));
    }
    for entry in classroom_conflicts {
        parts.push(format!(
            "Classroom conflict: {} is already booked for {} taught by {} on {}.",
            resolved.classroom.display_name(),
            entry.subject_label(),
            entry.faculty_name,
            slot
        ));
    }
    parts.join(" ")
}

fn details_of(resolved: &ResolvedAssignment) -> ConflictDetails {
    ConflictDetails {
        faculty_name: resolved.faculty.name.clone(),
        classroom_name: resolved.classroom.display_name(),
        time_slot: resolved.slot.label(),
        day: resolved.slot.day,
        start_time: resolved.slot.start_time,
        end_time: resolved.slot.end_time,
    }
}

fn resolution_error(err: RepositoryError, query: &ConflictQuery) -> EngineError {
    if !err.is_not_found() {
        return EngineError::PrimaryCheckFailed(err);
    }
    let (resource, id) = match err.context().entity.as_deref() {
        Some("faculty") => (ResourceKind::Faculty, query.faculty_id.value()),
        Some("classroom") => (ResourceKind::Classroom, query.classroom_id.value()),
        Some("time_slot") => (ResourceKind::TimeSlot, query.slot_id.value()),
        _ => return EngineError::PrimaryCheckFailed(err),
    };
    EngineError::ResourceNotFound { resource, id }
}

/// Check a proposed assignment against the active timetable.
///
/// # Errors
/// * `InvalidArgument` for malformed ids, term or subject/section pairing.
/// * `ResourceNotFound` when the faculty, classroom or slot does not exist.
/// * `PrimaryCheckFailed` when the resources or the conflict sets could not
///   be read. Callers must not treat this as a valid assignment; see
///   [`check_conflicts_fail_closed`].
pub async fn check_conflicts<R>(repo: &R, request: &ConflictCheckRequest) -> EngineResult<ConflictVerdict>
where
    R: CatalogRepository + TimetableRepository + ?Sized,
{
    let query = ConflictQuery::from_request(request)?;
    check_query(repo, &query).await
}

/// Same as [`check_conflicts`], but a failed primary check yields a
/// conflicting verdict instead of an error.
///
/// Invalid input and unknown resources are still returned as errors: they
/// mean the request cannot be validated at all.
pub async fn check_conflicts_fail_closed<R>(
    repo: &R,
    request: &ConflictCheckRequest,
) -> EngineResult<ConflictVerdict>
where
    R: CatalogRepository + TimetableRepository + ?Sized,
{
    match check_conflicts(repo, request).await {
        Err(err @ (EngineError::PrimaryCheckFailed(_) | EngineError::Repository(_))) => {
            warn!("Conflict check failed, assuming conflict: {}", err);
            Ok(ConflictVerdict::fail_closed(&err))
        }
        other => other,
    }
}

pub async fn check_query<R>(repo: &R, query: &ConflictQuery) -> EngineResult<ConflictVerdict>
where
    R: CatalogRepository + TimetableRepository + ?Sized,
{
    debug!(
        "Checking faculty {} / classroom {} / slot {} for {}",
        query.faculty_id, query.classroom_id, query.slot_id, query.term
    );

    let resolved = repo
        .resolve_assignment(query.faculty_id, query.classroom_id, query.slot_id)
        .await
        .map_err(|err| resolution_error(err, query))?;

    let faculty_filter = query.filter().with_faculty(query.faculty_id);
    let classroom_filter = query.filter().with_classroom(query.classroom_id);
    let (faculty_conflicts, classroom_conflicts) = tokio::join!(
        repo.list_active_entries(&faculty_filter),
        repo.list_active_entries(&classroom_filter),
    );
    let faculty_conflicts = faculty_conflicts.map_err(EngineError::PrimaryCheckFailed)?;
    let classroom_conflicts = classroom_conflicts.map_err(EngineError::PrimaryCheckFailed)?;

    let details = details_of(&resolved);

    if !faculty_conflicts.is_empty() || !classroom_conflicts.is_empty() {
        info!(
            "Conflict for slot {} in {}: {} faculty, {} classroom",
            query.slot_id,
            query.term,
            faculty_conflicts.len(),
            classroom_conflicts.len()
        );
        let message = conflict_message(&resolved, &faculty_conflicts, &classroom_conflicts);
        let conflicts = faculty_conflicts
            .iter()
            .map(|e| ConflictRecord::from_entry(ConflictKind::Faculty, e))
            .chain(
                classroom_conflicts
                    .iter()
                    .map(|e| ConflictRecord::from_entry(ConflictKind::Classroom, e)),
            )
            .collect();
        return Ok(ConflictVerdict {
            has_conflict: true,
            message,
            details: Some(details),
            conflicts,
            warnings: Vec::new(),
            additional_info: None,
        });
    }

    let capacity = resolved.classroom.capacity;
    let day_query = |resource| DayQuery {
        resource,
        day: resolved.slot.day,
        term: query.term,
        exclude_slot: Some(query.slot_id),
    };
    let faculty_day = day_query(ResourceRef::Faculty(query.faculty_id));
    let classroom_day = day_query(ResourceRef::Classroom(query.classroom_id));

    let enrolled_future = async {
        match &query.section {
            Some((subject_id, section)) => Some(
                repo.count_enrolled(*subject_id, section, &query.term, EnrollmentStatus::Enrolled)
                    .await,
            ),
            None => None,
        }
    };
    let (enrolled, faculty_day_schedule, classroom_day_schedule, slot_popularity) = tokio::join!(
        enrolled_future,
        repo.list_day_entries(&faculty_day),
        repo.list_day_entries(&classroom_day),
        repo.count_slot_entries(query.slot_id, &query.term, query.exclude_entry_id),
    );

    let enrolled_students = enrolled.and_then(|r| advisory("enrollment_count", r));
    let mut warnings = Vec::new();
    if let Some(enrolled) = enrolled_students {
        if let Some(kind) = capacity_warning(enrolled, capacity) {
            warnings.push(ScheduleWarning::new(
                kind,
                capacity_message(kind, enrolled, capacity),
            ));
        }
    }
    warnings.extend(status_warnings(&resolved));

    let message = if warnings.is_empty() {
        format!(
            "No conflicts: {} can teach in {} on {}.",
            details.faculty_name, details.classroom_name, details.time_slot
        )
    } else {
        "No scheduling conflicts found, but please review the warnings before saving.".to_string()
    };

    Ok(ConflictVerdict {
        has_conflict: false,
        message,
        details: Some(details),
        conflicts: Vec::new(),
        warnings,
        additional_info: Some(AdditionalInfo {
            classroom_capacity: capacity,
            enrolled_students,
            faculty_day_schedule: advisory("faculty_day_schedule", faculty_day_schedule),
            classroom_day_schedule: advisory("classroom_day_schedule", classroom_day_schedule),
            slot_popularity: advisory("slot_popularity", slot_popularity),
        }),
    })
}
