//! Integration tests for the utilization analyzer against the local repository.

mod support;

use chrono::Weekday;
use timetable_engine::api::{ReportSection, UsageLevel, UtilizationStatus};
use timetable_engine::db::models::ClassroomFilter;
use timetable_engine::db::{LocalRepository, QueryKind};
use timetable_engine::models::{CapacityBand, ClassroomId, DepartmentId};
use timetable_engine::services::{
    build_utilization_report, EngineError, ReportingPeriod, UtilizationQuery,
};

use support::{at, catalog, classroom, date, enroll, entry, slot, term, AY};

/// Fall 2025 semester, as seen from mid October.
fn semester_query() -> UtilizationQuery {
    UtilizationQuery::for_period(ReportingPeriod::CurrentSemester, date(2025, 10, 15))
}

/// R-105 hosts three CS101 sections (20, 10 and 0 students); M-101 hosts
/// one Linear Algebra class of 10. R-207 is unused.
fn scheduled_campus() -> LocalRepository {
    let repo = catalog();
    let t = term(1, AY);
    repo.insert_entry(entry(1, 101, 5, 1, 201, "A", t, at(2025, 9, 1)));
    repo.insert_entry(entry(2, 101, 5, 2, 201, "B", t, at(2025, 9, 1)));
    repo.insert_entry(entry(3, 102, 5, 3, 201, "C", t, at(2025, 9, 3)));
    repo.insert_entry(entry(4, 103, 9, 1, 301, "A", t, at(2025, 9, 2)));
    // Created before the semester window
    repo.insert_entry(entry(5, 102, 7, 4, 202, "A", term(2, "2024-2025"), at(2025, 3, 1)));

    enroll(&repo, 201, "A", t, 1, 20);
    enroll(&repo, 201, "B", t, 100, 10);
    enroll(&repo, 301, "A", t, 200, 10);
    repo
}

#[tokio::test]
async fn test_room_table() {
    let repo = scheduled_campus();
    let report = build_utilization_report(&repo, &semester_query()).await.unwrap();

    assert_eq!(report.window.start, date(2025, 8, 1));
    assert_eq!(report.window.end, date(2025, 12, 31));
    assert!(report.unavailable_sections.is_empty());

    // Inactive R-001 is not part of the population
    let ids: Vec<i64> = report.rooms.iter().map(|r| r.classroom_id.value()).collect();
    assert_eq!(ids, vec![5, 7, 9]);

    let r105 = &report.rooms[0];
    assert_eq!(r105.scheduled_hours, 3);
    assert_eq!(r105.available_hours, 40);
    assert_eq!(r105.utilization_percentage, 7.5);
    assert_eq!(r105.average_occupancy, 10.0);
    assert_eq!(r105.average_occupancy_percentage, 33.33);
    assert_eq!(r105.peak_occupancy, 20);
    assert_eq!(r105.min_occupancy, 0);
    assert_eq!(r105.most_frequent_day, Some(Weekday::Mon));
    assert_eq!(r105.distinct_subjects, 1);
    assert_eq!(r105.distinct_faculty, 2);
    assert_eq!(r105.department_name.as_deref(), Some("Computer Science"));
    assert_eq!(r105.status, UtilizationStatus::Underutilized);

    let r207 = &report.rooms[1];
    assert_eq!(r207.scheduled_hours, 0);
    assert_eq!(r207.status, UtilizationStatus::Unused);
    assert_eq!(r207.most_frequent_day, None);

    let m101 = &report.rooms[2];
    assert_eq!(m101.department_id, None);
    assert_eq!(m101.department_name, None);
}

#[tokio::test]
async fn test_summary() {
    let repo = scheduled_campus();
    let report = build_utilization_report(&repo, &semester_query()).await.unwrap();

    let summary = &report.summary;
    assert_eq!(summary.total_rooms, 3);
    assert_eq!(summary.total_scheduled_hours, 4);
    assert_eq!(summary.unused_rooms, 1);
    assert_eq!(summary.underutilized_rooms, 2);
    assert_eq!(summary.optimal_rooms, 0);
    assert_eq!(summary.overutilized_rooms, 0);
    // (7.5 + 0 + 2.5) / 3
    assert_eq!(summary.average_utilization_percentage, 3.33);
}

#[tokio::test]
async fn test_weekly_trend_covers_every_slot() {
    let repo = scheduled_campus();
    let report = build_utilization_report(&repo, &semester_query()).await.unwrap();

    let trend = report.weekly_trend.unwrap();
    let counts: Vec<(i64, u32, u32)> = trend
        .iter()
        .map(|row| (row.slot_id.value(), row.class_count, row.rooms_in_use))
        .collect();
    assert_eq!(counts, vec![(1, 2, 2), (2, 1, 1), (3, 1, 1), (4, 0, 0)]);
    assert_eq!(trend[0].room_utilization_percentage, 66.67);
    assert_eq!(trend[3].room_utilization_percentage, 0.0);
}

#[tokio::test]
async fn test_department_table() {
    let repo = scheduled_campus();
    let report = build_utilization_report(&repo, &semester_query()).await.unwrap();

    let departments = report.departments.unwrap();
    assert_eq!(departments.len(), 2);

    let cs = &departments[0];
    assert_eq!(cs.department_name, "Computer Science");
    assert_eq!(cs.owned_classrooms, 2);
    assert_eq!(cs.total_classes, 3);
    assert_eq!(cs.own_room_usage, 3);
    assert_eq!(cs.external_room_usage, 0);
    assert_eq!(cs.own_room_utilization_rate, 3.75);
    assert_eq!(cs.average_owned_capacity, 45.0);
    assert_eq!(cs.student_hours, 30);

    let math = &departments[1];
    assert_eq!(math.department_name, "Mathematics");
    assert_eq!(math.owned_classrooms, 0);
    assert_eq!(math.external_room_usage, 1);
    assert_eq!(math.own_room_utilization_rate, 0.0);
    assert_eq!(math.student_hours, 10);
}

#[tokio::test]
async fn test_underutilized_rooms_are_ordered_and_recommended() {
    let repo = scheduled_campus();
    let report = build_utilization_report(&repo, &semester_query()).await.unwrap();

    let ids: Vec<i64> = report
        .underutilized_rooms
        .iter()
        .map(|r| r.classroom_id.value())
        .collect();
    // 0% first, then 2.5%, then 7.5%
    assert_eq!(ids, vec![7, 9, 5]);

    let unused = &report.underutilized_rooms[0];
    assert!(unused.capacity_efficiency_ratio.is_none());
    assert!(unused.recommendation_text.contains("repurposing"));

    let r105 = &report.underutilized_rooms[2];
    assert_eq!(r105.capacity_efficiency_ratio, Some(3.0));
    assert!(r105.recommendation_text.contains("additional scheduling"));
}

#[tokio::test]
async fn test_empty_rooms_have_null_efficiency_ratio() {
    let repo = catalog();
    // Scheduled, but nobody enrolled
    repo.insert_entry(entry(1, 101, 7, 1, 202, "A", term(1, AY), at(2025, 9, 1)));

    let report = build_utilization_report(&repo, &semester_query()).await.unwrap();
    let r207 = report
        .underutilized_rooms
        .iter()
        .find(|r| r.classroom_id == ClassroomId::new(7))
        .unwrap();
    assert_eq!(r207.average_actual_occupancy, 0.0);
    assert_eq!(r207.capacity_efficiency_ratio, None);

    let json = serde_json::to_value(r207).unwrap();
    assert!(json["capacity_efficiency_ratio"].is_null());
}

/// One room with `hours` classes in distinct generated slots.
async fn status_for_hours(hours: i64) -> UtilizationStatus {
    let repo = LocalRepository::new();
    repo.insert_classroom(classroom(1, "X-1", "Annex", 0, 50, None));
    repo.insert_subject(support::subject(1, "GEN100", "General Studies", 1));
    let t = term(1, AY);
    let days = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];
    for n in 0..hours {
        let slot_id = 100 + n;
        repo.insert_time_slot(slot(slot_id, days[(n % 5) as usize], 8 + (n / 5) as u32));
        repo.insert_entry(entry(slot_id, 1, 1, slot_id, 1, "A", t, at(2025, 9, 1)));
    }

    let report = build_utilization_report(&repo, &semester_query()).await.unwrap();
    report.rooms[0].status
}

#[tokio::test]
async fn test_classification_boundaries() {
    assert_eq!(status_for_hours(0).await, UtilizationStatus::Unused);
    assert_eq!(status_for_hours(10).await, UtilizationStatus::Underutilized);
    assert_eq!(status_for_hours(20).await, UtilizationStatus::Optimal);
    assert_eq!(status_for_hours(35).await, UtilizationStatus::Overutilized);
}

#[tokio::test]
async fn test_peak_hours_against_used_slot_mean() {
    let repo = LocalRepository::new();
    repo.insert_subject(support::subject(1, "GEN100", "General Studies", 1));
    for room in 1..=10 {
        repo.insert_classroom(classroom(room, &format!("X-{}", room), "Annex", 0, 40, None));
    }
    // Class counts per slot: 10, 10, 10, 1, 1 and one idle slot
    let t = term(1, AY);
    let counts = [(1, 10), (2, 10), (3, 10), (4, 1), (5, 1), (6, 0)];
    let mut next_entry = 1;
    for (slot_id, count) in counts {
        repo.insert_time_slot(slot(slot_id, Weekday::Thu, 7 + slot_id as u32));
        for room in 1..=count {
            repo.insert_entry(entry(next_entry, room, room, slot_id, 1, "A", t, at(2025, 9, 1)));
            next_entry += 1;
        }
    }

    let report = build_utilization_report(&repo, &semester_query()).await.unwrap();
    let peak = report.peak_hours.unwrap();

    // The idle slot is not part of the peak-hour table
    assert_eq!(peak.len(), 5);
    let levels: Vec<UsageLevel> = peak.iter().map(|p| p.usage_level).collect();
    assert_eq!(
        levels,
        vec![
            UsageLevel::Peak,
            UsageLevel::Peak,
            UsageLevel::Peak,
            UsageLevel::Low,
            UsageLevel::Low
        ]
    );
    assert_eq!(peak[0].demand_intensity, 1.0);
}

#[tokio::test]
async fn test_room_filters() {
    let repo = scheduled_campus();

    let by_building = semester_query().with_rooms(ClassroomFilter {
        building: Some("Math Hall".to_string()),
        ..Default::default()
    });
    let report = build_utilization_report(&repo, &by_building).await.unwrap();
    assert_eq!(report.rooms.len(), 1);
    assert_eq!(report.rooms[0].room_number, "M-101");
    // Trend percentages are relative to the filtered population
    assert_eq!(report.weekly_trend.unwrap()[0].room_utilization_percentage, 100.0);

    let small = semester_query().with_rooms(ClassroomFilter {
        capacity_band: Some(CapacityBand::Small),
        ..Default::default()
    });
    let report = build_utilization_report(&repo, &small).await.unwrap();
    let ids: Vec<i64> = report.rooms.iter().map(|r| r.classroom_id.value()).collect();
    assert_eq!(ids, vec![5]);

    let owned = semester_query().with_rooms(ClassroomFilter {
        department_id: Some(DepartmentId::new(1)),
        floor: Some(2),
        ..Default::default()
    });
    let report = build_utilization_report(&repo, &owned).await.unwrap();
    let ids: Vec<i64> = report.rooms.iter().map(|r| r.classroom_id.value()).collect();
    assert_eq!(ids, vec![7]);
}

#[tokio::test]
async fn test_window_and_term_scoping() {
    let repo = scheduled_campus();

    let spring = UtilizationQuery::for_period(ReportingPeriod::CurrentSemester, date(2025, 4, 2));
    let report = build_utilization_report(&repo, &spring).await.unwrap();
    assert_eq!(report.summary.total_scheduled_hours, 1);
    assert_eq!(report.rooms[1].scheduled_hours, 1);

    let other_term = semester_query().with_term(Some(term(2, AY)));
    let report = build_utilization_report(&repo, &other_term).await.unwrap();
    assert_eq!(report.summary.total_scheduled_hours, 0);

    let same_term = semester_query().with_term(Some(term(1, AY)));
    let report = build_utilization_report(&repo, &same_term).await.unwrap();
    assert_eq!(report.summary.total_scheduled_hours, 4);
}

#[tokio::test]
async fn test_identical_calls_are_byte_identical() {
    let repo = scheduled_campus();
    let query = semester_query();

    let first = build_utilization_report(&repo, &query).await.unwrap();
    let second = build_utilization_report(&repo, &query).await.unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_failed_sections_degrade_independently() {
    let repo = scheduled_campus();
    repo.fail_query(QueryKind::WeeklySlotUsage);
    repo.fail_query(QueryKind::ListDepartments);

    let report = build_utilization_report(&repo, &semester_query()).await.unwrap();

    assert!(report.weekly_trend.is_none());
    assert!(report.peak_hours.is_none());
    assert!(report.departments.is_some());
    assert_eq!(
        report.unavailable_sections,
        vec![ReportSection::WeeklyTrend, ReportSection::PeakHours]
    );
    // Room table still complete, only the department names are missing
    assert_eq!(report.rooms.len(), 3);
    assert!(report.rooms.iter().all(|r| r.department_name.is_none()));
    assert_eq!(report.rooms[0].scheduled_hours, 3);
}

#[tokio::test]
async fn test_room_population_failure_is_an_error() {
    let repo = scheduled_campus();
    repo.fail_query(QueryKind::ListClassrooms);

    let err = build_utilization_report(&repo, &semester_query())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Repository(_)));
}

#[tokio::test]
async fn test_empty_population() {
    let repo = LocalRepository::new();
    let report = build_utilization_report(&repo, &semester_query()).await.unwrap();

    assert!(report.rooms.is_empty());
    assert_eq!(report.summary.total_rooms, 0);
    assert_eq!(report.summary.average_utilization_percentage, 0.0);
    assert_eq!(report.weekly_trend, Some(Vec::new()));
    assert_eq!(report.peak_hours, Some(Vec::new()));
}
