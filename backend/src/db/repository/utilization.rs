//! Aggregations behind the utilization report.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::db::models::{DepartmentUsageRow, RoomOccupancyRow, SlotUsageRow, UsageFilter};

/// Repository trait for utilization aggregates.
///
/// All three queries see the same room population: active classrooms
/// matching `filter.rooms`, and entries accepted by
/// [`UsageFilter::includes_entry`](crate::db::models::UsageFilter::includes_entry).
#[async_trait]
pub trait UtilizationRepository: Send + Sync {
    /// One row per scheduled entry in the filtered rooms with its live
    /// enrolled-student count, ordered by entry id.
    async fn list_room_occupancy(
        &self,
        filter: &UsageFilter,
    ) -> RepositoryResult<Vec<RoomOccupancyRow>>;

    /// One row per time slot (including unused slots), ordered by weekday
    /// then start time.
    async fn aggregate_weekly_slot_usage(
        &self,
        filter: &UsageFilter,
    ) -> RepositoryResult<Vec<SlotUsageRow>>;

    /// One row per department, ordered by department name then id.
    async fn aggregate_department_usage(
        &self,
        filter: &UsageFilter,
    ) -> RepositoryResult<Vec<DepartmentUsageRow>>;
}
