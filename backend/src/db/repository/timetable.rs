//! Timetable queries used by the conflict validator.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::db::models::{
    DayQuery, EnrollmentStatus, EntryDetail, EntryFilter, EntryId, SubjectId, Term, TimeSlotId,
};

/// Repository trait for active timetable entries and enrollment counts.
///
/// Soft-deleted entries are invisible to every method of this trait.
#[async_trait]
pub trait TimetableRepository: Send + Sync {
    /// Active entries matching the filter, joined with display data and
    /// ordered by entry id.
    async fn list_active_entries(&self, filter: &EntryFilter) -> RepositoryResult<Vec<EntryDetail>>;

    /// Active entries of a faculty member or classroom on one weekday of a
    /// term, ordered by start time.
    async fn list_day_entries(&self, query: &DayQuery) -> RepositoryResult<Vec<EntryDetail>>;

    /// Number of active entries using a slot during a term.
    async fn count_slot_entries(
        &self,
        slot_id: TimeSlotId,
        term: &Term,
        exclude_id: Option<EntryId>,
    ) -> RepositoryResult<u32>;

    /// Number of students with the given status in a subject section.
    async fn count_enrolled(
        &self,
        subject_id: SubjectId,
        section: &str,
        term: &Term,
        status: EnrollmentStatus,
    ) -> RepositoryResult<u32>;
}
