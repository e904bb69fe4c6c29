//! Catalog lookups: faculty, classrooms, time slots, departments.

use async_trait::async_trait;

use super::error::{ErrorContext, RepositoryError, RepositoryResult};
use crate::db::models::{
    Classroom, ClassroomFilter, ClassroomId, Department, Faculty, FacultyId, ResolvedAssignment,
    TimeSlot, TimeSlotId,
};

/// Repository trait for catalog entities.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Check that the backing store answers queries.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Fetch a faculty member, `NotFound` if the id does not resolve.
    async fn find_faculty(&self, id: FacultyId) -> RepositoryResult<Faculty>;

    /// Fetch a classroom, `NotFound` if the id does not resolve.
    async fn find_classroom(&self, id: ClassroomId) -> RepositoryResult<Classroom>;

    /// Fetch a time slot, `NotFound` if the id does not resolve.
    async fn find_time_slot(&self, id: TimeSlotId) -> RepositoryResult<TimeSlot>;

    /// Resolve the three resources of a proposed assignment.
    ///
    /// Backends that can do so answer this with a single query. The default
    /// implementation falls back to the individual lookups and stops at the
    /// first missing resource.
    async fn resolve_assignment(
        &self,
        faculty_id: FacultyId,
        classroom_id: ClassroomId,
        slot_id: TimeSlotId,
    ) -> RepositoryResult<ResolvedAssignment> {
        let faculty = self.find_faculty(faculty_id).await?;
        let classroom = self.find_classroom(classroom_id).await?;
        let slot = self.find_time_slot(slot_id).await?;
        Ok(ResolvedAssignment {
            faculty,
            classroom,
            slot,
        })
    }

    /// Active classrooms matching the facet filters, ordered by id.
    async fn list_classrooms(&self, filter: &ClassroomFilter) -> RepositoryResult<Vec<Classroom>>;

    /// All departments, ordered by id.
    async fn list_departments(&self) -> RepositoryResult<Vec<Department>>;

    /// The full time-slot enumeration, ordered by weekday then start time.
    async fn list_time_slots(&self) -> RepositoryResult<Vec<TimeSlot>>;
}

/// Build the `NotFound` error used by every backend for unresolved ids.
pub fn missing(entity: &str, id: impl ToString, operation: &str) -> RepositoryError {
    let id = id.to_string();
    RepositoryError::not_found_with_context(
        format!("{} {} not found", entity, id),
        ErrorContext::new(operation)
            .with_entity(entity)
            .with_entity_id(id),
    )
}
