//! Classroom utilization report.
//!
//! All figures are computed over one room population: active classrooms
//! matching the facet filters. Entries count when they are active, fall in
//! the reporting window and, if given, belong to the requested term.
//!
//! The per-room table is the primary result and its failure fails the
//! report. The weekly trend, department and peak-hour tables are computed
//! best-effort and listed in `unavailable_sections` when their queries fail.

use chrono::{NaiveDate, Weekday};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

use crate::api::{
    DepartmentUtilization, PeakHourRow, Recommendation, ReportSection, RoomUtilization,
    UnderutilizedRoom, UsageLevel, UtilizationReport, UtilizationStatus, UtilizationSummary,
    WeeklyTrendRow,
};
use crate::db::models::{
    Classroom, ClassroomFilter, ClassroomId, DepartmentId, DepartmentUsageRow, RoomOccupancyRow,
    SlotUsageRow, Term, UsageFilter,
};
use crate::db::repository::{CatalogRepository, UtilizationRepository};
use crate::services::error::{advisory, EngineResult};
use crate::services::window::{ReportingPeriod, ReportingWindow};

/// Theoretically available teaching hours per room and week (5 days x 8 slots).
pub const WEEKLY_AVAILABLE_HOURS: u32 = 40;

const UNDERUTILIZED_BELOW: f64 = 30.0;
const OVERUTILIZED_ABOVE: f64 = 80.0;
const LOW_UTILIZATION_BELOW: f64 = 50.0;
const LOW_OCCUPANCY_SHARE: f64 = 0.4;
const SMALLER_ROOM_SHARE: f64 = 0.3;
const FEW_HOURS_BELOW: u32 = 5;
const PEAK_FACTOR: f64 = 1.5;
const LOW_FACTOR: f64 = 0.5;

/// Inputs of a utilization report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilizationQuery {
    pub period: Option<ReportingPeriod>,
    pub window: ReportingWindow,
    pub rooms: ClassroomFilter,
    pub term: Option<Term>,
}

impl UtilizationQuery {
    /// Report over a period keyword resolved against `reference`.
    pub fn for_period(period: ReportingPeriod, reference: NaiveDate) -> Self {
        Self {
            period: Some(period),
            window: period.window(reference),
            rooms: ClassroomFilter::default(),
            term: None,
        }
    }

    pub fn for_window(window: ReportingWindow) -> Self {
        Self {
            period: None,
            window,
            rooms: ClassroomFilter::default(),
            term: None,
        }
    }

    pub fn with_rooms(mut self, rooms: ClassroomFilter) -> Self {
        self.rooms = rooms;
        self
    }

    pub fn with_term(mut self, term: Option<Term>) -> Self {
        self.term = term;
        self
    }

    fn usage_filter(&self) -> UsageFilter {
        UsageFilter {
            rooms: self.rooms.clone(),
            window: self.window,
            term: self.term,
        }
    }
}

/// `part / whole` as a percentage in [0, 100]; 0 when `whole` is zero.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    (part / whole * 100.0).clamp(0.0, 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn classify_utilization(scheduled_hours: u32, utilization_percentage: f64) -> UtilizationStatus {
    if scheduled_hours == 0 {
        UtilizationStatus::Unused
    } else if utilization_percentage < UNDERUTILIZED_BELOW {
        UtilizationStatus::Underutilized
    } else if utilization_percentage > OVERUTILIZED_ABOVE {
        UtilizationStatus::Overutilized
    } else {
        UtilizationStatus::Optimal
    }
}

/// Classify a slot's class count against the mean over all used slots.
pub fn classify_usage_level(class_count: u32, mean: f64) -> UsageLevel {
    let count = f64::from(class_count);
    if count > PEAK_FACTOR * mean {
        UsageLevel::Peak
    } else if count < LOW_FACTOR * mean {
        UsageLevel::Low
    } else {
        UsageLevel::Normal
    }
}

pub fn recommendation_for(scheduled_hours: u32, average_occupancy: f64, capacity: u32) -> Recommendation {
    if scheduled_hours == 0 {
        Recommendation::RepurposeOrMaintenance
    } else if scheduled_hours < FEW_HOURS_BELOW {
        Recommendation::AdditionalScheduling
    } else if average_occupancy < SMALLER_ROOM_SHARE * f64::from(capacity) {
        Recommendation::SmallerCapacity
    } else {
        Recommendation::Monitor
    }
}

/// Seats per attending student, `None` when nobody attends.
pub fn capacity_efficiency_ratio(capacity: u32, average_occupancy: f64) -> Option<f64> {
    (average_occupancy > 0.0).then(|| round2(f64::from(capacity) / average_occupancy))
}

/// Most frequent weekday; ties go to the earliest day of the week.
fn most_frequent_day(days: impl Iterator<Item = Weekday>) -> Option<Weekday> {
    let mut counts: BTreeMap<u32, (Weekday, u32)> = BTreeMap::new();
    for day in days {
        counts.entry(day.num_days_from_monday()).or_insert((day, 0)).1 += 1;
    }
    let mut best: Option<(Weekday, u32)> = None;
    for (day, count) in counts.into_values() {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((day, count));
        }
    }
    best.map(|(day, _)| day)
}

fn room_utilization(
    room: &Classroom,
    rows: &[&RoomOccupancyRow],
    department_names: Option<&BTreeMap<DepartmentId, String>>,
) -> RoomUtilization {
    let scheduled_hours =
        u32::try_from(rows.iter().map(|r| r.entry_id).collect::<BTreeSet<_>>().len())
            .unwrap_or(u32::MAX);
    let utilization = percentage(
        f64::from(scheduled_hours),
        f64::from(WEEKLY_AVAILABLE_HOURS),
    );

    let average_occupancy = if rows.is_empty() {
        0.0
    } else {
        rows.iter().map(|r| f64::from(r.enrolled)).sum::<f64>() / rows.len() as f64
    };

    RoomUtilization {
        classroom_id: room.id,
        room_number: room.room_number.clone(),
        building: room.building.clone(),
        floor: room.floor,
        capacity: room.capacity,
        room_type: room.room_type,
        department_id: room.department_id,
        department_name: room
            .department_id
            .and_then(|id| department_names.and_then(|names| names.get(&id).cloned())),
        scheduled_hours,
        available_hours: WEEKLY_AVAILABLE_HOURS,
        utilization_percentage: round2(utilization),
        average_occupancy: round2(average_occupancy),
        average_occupancy_percentage: round2(percentage(
            average_occupancy,
            f64::from(room.capacity),
        )),
        exact_average_occupancy: average_occupancy,
        peak_occupancy: rows.iter().map(|r| r.enrolled).max().unwrap_or(0),
        min_occupancy: rows.iter().map(|r| r.enrolled).min().unwrap_or(0),
        most_frequent_day: most_frequent_day(rows.iter().map(|r| r.day)),
        distinct_subjects: rows
            .iter()
            .map(|r| r.subject_id)
            .collect::<BTreeSet<_>>()
            .len() as u32,
        distinct_faculty: rows
            .iter()
            .map(|r| r.faculty_id)
            .collect::<BTreeSet<_>>()
            .len() as u32,
        status: classify_utilization(scheduled_hours, utilization),
    }
}

/// Per-room table, in classroom id order.
pub fn compute_room_table(
    rooms: &[Classroom],
    occupancy: &[RoomOccupancyRow],
    department_names: Option<&BTreeMap<DepartmentId, String>>,
) -> Vec<RoomUtilization> {
    let mut by_room: BTreeMap<ClassroomId, Vec<&RoomOccupancyRow>> = BTreeMap::new();
    for row in occupancy {
        by_room.entry(row.classroom_id).or_default().push(row);
    }
    let mut table: Vec<RoomUtilization> = rooms
        .iter()
        .map(|room| {
            let rows = by_room.get(&room.id).map(Vec::as_slice).unwrap_or(&[]);
            room_utilization(room, rows, department_names)
        })
        .collect();
    table.sort_by_key(|r| r.classroom_id);
    table
}

pub fn compute_weekly_trend(slots: &[SlotUsageRow], active_rooms: usize) -> Vec<WeeklyTrendRow> {
    slots
        .iter()
        .map(|slot| WeeklyTrendRow {
            slot_id: slot.slot_id,
            day: slot.day,
            start_time: slot.start_time,
            end_time: slot.end_time,
            class_count: slot.class_count,
            rooms_in_use: slot.rooms_in_use,
            room_utilization_percentage: round2(percentage(
                f64::from(slot.rooms_in_use),
                active_rooms as f64,
            )),
        })
        .collect()
}

pub fn compute_department_table(rows: &[DepartmentUsageRow]) -> Vec<DepartmentUtilization> {
    rows.iter()
        .map(|row| DepartmentUtilization {
            department_id: row.department_id,
            department_name: row.department_name.clone(),
            owned_classrooms: row.owned_classrooms,
            total_classes: row.total_classes,
            own_room_usage: row.own_room_usage,
            external_room_usage: row.external_room_usage,
            own_room_utilization_rate: round2(percentage(
                f64::from(row.own_room_usage),
                f64::from(row.owned_classrooms) * f64::from(WEEKLY_AVAILABLE_HOURS),
            )),
            average_owned_capacity: round2(row.average_owned_capacity),
            student_hours: row.student_hours,
        })
        .collect()
}

/// Peak-hour classification.
///
/// The mean class count is computed once over the slots that have at least
/// one class, then every such slot is classified against it.
pub fn compute_peak_hours(slots: &[SlotUsageRow]) -> Vec<PeakHourRow> {
    let used: Vec<&SlotUsageRow> = slots.iter().filter(|s| s.class_count > 0).collect();
    if used.is_empty() {
        return Vec::new();
    }
    let mean = used.iter().map(|s| f64::from(s.class_count)).sum::<f64>() / used.len() as f64;
    debug!("Peak-hour mean class count: {:.2} over {} slot(s)", mean, used.len());

    used.into_iter()
        .map(|slot| PeakHourRow {
            slot_id: slot.slot_id,
            day: slot.day,
            start_time: slot.start_time,
            end_time: slot.end_time,
            class_count: slot.class_count,
            rooms_in_use: slot.rooms_in_use,
            demand_intensity: if slot.rooms_in_use == 0 {
                0.0
            } else {
                round2(f64::from(slot.class_count) / f64::from(slot.rooms_in_use))
            },
            usage_level: classify_usage_level(slot.class_count, mean),
        })
        .collect()
}

/// Rooms with low utilization or low occupancy, least used first.
pub fn compute_underutilized(rooms: &[RoomUtilization]) -> Vec<UnderutilizedRoom> {
    let mut list: Vec<UnderutilizedRoom> = rooms
        .iter()
        .filter(|room| {
            room.utilization_percentage < LOW_UTILIZATION_BELOW
                || room.exact_average_occupancy < LOW_OCCUPANCY_SHARE * f64::from(room.capacity)
        })
        .map(|room| {
            let recommendation = recommendation_for(
                room.scheduled_hours,
                room.exact_average_occupancy,
                room.capacity,
            );
            UnderutilizedRoom {
                classroom_id: room.classroom_id,
                room_number: room.room_number.clone(),
                building: room.building.clone(),
                capacity: room.capacity,
                scheduled_hours: room.scheduled_hours,
                utilization_rate: room.utilization_percentage,
                average_actual_occupancy: room.average_occupancy,
                capacity_efficiency_ratio: capacity_efficiency_ratio(
                    room.capacity,
                    room.exact_average_occupancy,
                ),
                recommendation,
                recommendation_text: recommendation.text().to_string(),
            }
        })
        .collect();
    list.sort_by(|a, b| {
        a.utilization_rate
            .total_cmp(&b.utilization_rate)
            .then(a.classroom_id.cmp(&b.classroom_id))
    });
    list
}

pub fn summarize(rooms: &[RoomUtilization]) -> UtilizationSummary {
    let count = |status: UtilizationStatus| {
        rooms.iter().filter(|r| r.status == status).count() as u32
    };
    let average = if rooms.is_empty() {
        0.0
    } else {
        rooms.iter().map(|r| r.utilization_percentage).sum::<f64>() / rooms.len() as f64
    };
    UtilizationSummary {
        total_rooms: rooms.len() as u32,
        total_scheduled_hours: rooms.iter().map(|r| r.scheduled_hours).sum(),
        average_utilization_percentage: round2(average),
        unused_rooms: count(UtilizationStatus::Unused),
        underutilized_rooms: count(UtilizationStatus::Underutilized),
        optimal_rooms: count(UtilizationStatus::Optimal),
        overutilized_rooms: count(UtilizationStatus::Overutilized),
    }
}

/// Build the utilization report for a query.
///
/// # Errors
/// Fails only when the room population or its occupancy rows cannot be
/// read. Other sections degrade to `None`.
pub async fn build_utilization_report<R>(repo: &R, query: &UtilizationQuery) -> EngineResult<UtilizationReport>
where
    R: CatalogRepository + UtilizationRepository + ?Sized,
{
    let filter = query.usage_filter();

    let (rooms, occupancy) = tokio::join!(
        repo.list_classrooms(&query.rooms),
        repo.list_room_occupancy(&filter),
    );
    let rooms = rooms?;
    let occupancy = occupancy?;

    let (departments, slot_usage, department_usage) = tokio::join!(
        repo.list_departments(),
        repo.aggregate_weekly_slot_usage(&filter),
        repo.aggregate_department_usage(&filter),
    );
    let department_names: Option<BTreeMap<DepartmentId, String>> = advisory(
        "department_names",
        departments,
    )
    .map(|list| list.into_iter().map(|d| (d.id, d.name)).collect());
    let slot_usage = advisory("weekly_slot_usage", slot_usage);
    let department_usage = advisory("department_usage", department_usage);

    let room_table = compute_room_table(&rooms, &occupancy, department_names.as_ref());
    let weekly_trend = slot_usage
        .as_deref()
        .map(|slots| compute_weekly_trend(slots, rooms.len()));
    let peak_hours = slot_usage.as_deref().map(compute_peak_hours);
    let departments = department_usage.as_deref().map(compute_department_table);

    let mut unavailable_sections = Vec::new();
    if weekly_trend.is_none() {
        unavailable_sections.push(ReportSection::WeeklyTrend);
    }
    if departments.is_none() {
        unavailable_sections.push(ReportSection::Departments);
    }
    if peak_hours.is_none() {
        unavailable_sections.push(ReportSection::PeakHours);
    }

    let underutilized_rooms = compute_underutilized(&room_table);
    let summary = summarize(&room_table);
    info!(
        "Utilization report {}..{}: {} room(s), {} scheduled hour(s), {} section(s) unavailable",
        query.window.start,
        query.window.end,
        summary.total_rooms,
        summary.total_scheduled_hours,
        unavailable_sections.len()
    );

    Ok(UtilizationReport {
        period: query.period,
        window: query.window,
        rooms: room_table,
        weekly_trend,
        departments,
        peak_hours,
        underutilized_rooms,
        summary,
        unavailable_sections,
    })
}
