use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{ClassroomId, DepartmentId, RoomType, TimeSlotId};
use crate::services::window::{ReportingPeriod, ReportingWindow};

// =========================================================
// Utilization report types
// =========================================================

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilizationStatus {
    Unused,
    Underutilized,
    Optimal,
    Overutilized,
}

impl UtilizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UtilizationStatus::Unused => "unused",
            UtilizationStatus::Underutilized => "underutilized",
            UtilizationStatus::Optimal => "optimal",
            UtilizationStatus::Overutilized => "overutilized",
        }
    }
}

/// Per-room utilization figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomUtilization {
    pub classroom_id: ClassroomId,
    pub room_number: String,
    pub building: String,
    pub floor: i32,
    pub capacity: u32,
    pub room_type: RoomType,
    pub department_id: Option<DepartmentId>,
    pub department_name: Option<String>,
    pub scheduled_hours: u32,
    pub available_hours: u32,
    pub utilization_percentage: f64,
    /// Mean enrolled students per class, in students.
    pub average_occupancy: f64,
    pub average_occupancy_percentage: f64,
    /// Unrounded mean behind `average_occupancy`, for threshold checks.
    #[serde(skip)]
    pub exact_average_occupancy: f64,
    pub peak_occupancy: u32,
    pub min_occupancy: u32,
    pub most_frequent_day: Option<Weekday>,
    pub distinct_subjects: u32,
    pub distinct_faculty: u32,
    pub status: UtilizationStatus,
}

/// Usage of one (weekday, time slot) pair across the room population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTrendRow {
    pub slot_id: TimeSlotId,
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub class_count: u32,
    pub rooms_in_use: u32,
    pub room_utilization_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentUtilization {
    pub department_id: DepartmentId,
    pub department_name: String,
    pub owned_classrooms: u32,
    pub total_classes: u32,
    pub own_room_usage: u32,
    pub external_room_usage: u32,
    pub own_room_utilization_rate: f64,
    pub average_owned_capacity: f64,
    pub student_hours: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    Peak,
    Normal,
    Low,
}

/// Demand of a slot that has at least one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakHourRow {
    pub slot_id: TimeSlotId,
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub class_count: u32,
    pub rooms_in_use: u32,
    pub demand_intensity: f64,
    pub usage_level: UsageLevel,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    RepurposeOrMaintenance,
    AdditionalScheduling,
    SmallerCapacity,
    Monitor,
}

impl Recommendation {
    pub fn text(&self) -> &'static str {
        match self {
            Recommendation::RepurposeOrMaintenance => {
                "Room is unused; consider repurposing it or scheduling maintenance"
            }
            Recommendation::AdditionalScheduling => {
                "High potential for additional scheduling"
            }
            Recommendation::SmallerCapacity => {
                "Classes are much smaller than the room; consider a smaller capacity alternative"
            }
            Recommendation::Monitor => "Monitor for optimization opportunities",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderutilizedRoom {
    pub classroom_id: ClassroomId,
    pub room_number: String,
    pub building: String,
    pub capacity: u32,
    pub scheduled_hours: u32,
    pub utilization_rate: f64,
    pub average_actual_occupancy: f64,
    /// Seats per attending student, `None` when no students attend.
    pub capacity_efficiency_ratio: Option<f64>,
    pub recommendation: Recommendation,
    pub recommendation_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSummary {
    pub total_rooms: u32,
    pub total_scheduled_hours: u32,
    pub average_utilization_percentage: f64,
    pub unused_rooms: u32,
    pub underutilized_rooms: u32,
    pub optimal_rooms: u32,
    pub overutilized_rooms: u32,
}

/// Report sections that degrade independently of the room table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    WeeklyTrend,
    Departments,
    PeakHours,
}

/// Complete utilization report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationReport {
    pub period: Option<ReportingPeriod>,
    pub window: ReportingWindow,
    pub rooms: Vec<RoomUtilization>,
    pub weekly_trend: Option<Vec<WeeklyTrendRow>>,
    pub departments: Option<Vec<DepartmentUtilization>>,
    pub peak_hours: Option<Vec<PeakHourRow>>,
    pub underutilized_rooms: Vec<UnderutilizedRoom>,
    pub summary: UtilizationSummary,
    pub unavailable_sections: Vec<ReportSection>,
}

/// Route function name constant for the utilization report
pub const GET_UTILIZATION_REPORT: &str = "get_utilization_report";
