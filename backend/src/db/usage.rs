//! Utilization aggregation shared by the repository backends.
//!
//! Backends load the scheduled entries of the filtered room population as
//! [`UsageEntry`] values and hand them to these functions, so every backend
//! produces the same rows in the same order.

use chrono::Weekday;
use std::collections::{BTreeMap, BTreeSet};

use crate::db::models::{
    Classroom, ClassroomId, Department, DepartmentId, DepartmentUsageRow, EntryId, FacultyId,
    RoomOccupancyRow, SlotUsageRow, SubjectId, TimeSlot, TimeSlotId,
};

/// One active entry in a filtered room, with its live enrollment count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEntry {
    pub entry_id: EntryId,
    pub classroom_id: ClassroomId,
    pub faculty_id: FacultyId,
    pub subject_id: SubjectId,
    /// Department owning the subject; `None` if the subject is unknown.
    pub subject_department_id: Option<DepartmentId>,
    pub slot_id: TimeSlotId,
    pub day: Weekday,
    pub enrolled: u32,
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Occupancy rows ordered by entry id.
pub fn occupancy_rows(entries: &[UsageEntry]) -> Vec<RoomOccupancyRow> {
    let mut rows: Vec<RoomOccupancyRow> = entries
        .iter()
        .map(|e| RoomOccupancyRow {
            entry_id: e.entry_id,
            classroom_id: e.classroom_id,
            faculty_id: e.faculty_id,
            subject_id: e.subject_id,
            day: e.day,
            enrolled: e.enrolled,
        })
        .collect();
    rows.sort_by_key(|r| r.entry_id);
    rows
}

/// One row per slot of the enumeration, used or not.
pub fn slot_usage(slots: &[TimeSlot], entries: &[UsageEntry]) -> Vec<SlotUsageRow> {
    let mut per_slot: BTreeMap<TimeSlotId, (u32, BTreeSet<ClassroomId>)> = BTreeMap::new();
    for entry in entries {
        let (classes, rooms) = per_slot.entry(entry.slot_id).or_default();
        *classes += 1;
        rooms.insert(entry.classroom_id);
    }

    let mut ordered: Vec<&TimeSlot> = slots.iter().collect();
    ordered.sort_by_key(|s| s.sort_key());
    ordered
        .into_iter()
        .map(|slot| {
            let (class_count, rooms_in_use) = per_slot
                .get(&slot.id)
                .map(|(classes, rooms)| (*classes, count_u32(rooms.len())))
                .unwrap_or((0, 0));
            SlotUsageRow {
                slot_id: slot.id,
                day: slot.day,
                start_time: slot.start_time,
                end_time: slot.end_time,
                class_count,
                rooms_in_use,
            }
        })
        .collect()
}

/// One row per department, ordered by name then id.
///
/// A class belongs to the department of its subject. It counts as own-room
/// usage when the room is owned by that same department.
pub fn department_usage(
    departments: &[Department],
    rooms: &[Classroom],
    entries: &[UsageEntry],
) -> Vec<DepartmentUsageRow> {
    let room_owner: BTreeMap<ClassroomId, Option<DepartmentId>> =
        rooms.iter().map(|r| (r.id, r.department_id)).collect();

    let mut rows: Vec<DepartmentUsageRow> = departments
        .iter()
        .map(|dept| {
            let owned: Vec<&Classroom> = rooms
                .iter()
                .filter(|r| r.department_id == Some(dept.id))
                .collect();
            let average_owned_capacity = if owned.is_empty() {
                0.0
            } else {
                owned.iter().map(|r| f64::from(r.capacity)).sum::<f64>() / owned.len() as f64
            };

            let classes: Vec<&UsageEntry> = entries
                .iter()
                .filter(|e| e.subject_department_id == Some(dept.id))
                .collect();
            let own_room_usage = count_u32(
                classes
                    .iter()
                    .filter(|e| room_owner.get(&e.classroom_id).copied().flatten() == Some(dept.id))
                    .count(),
            );
            let total_classes = count_u32(classes.len());

            DepartmentUsageRow {
                department_id: dept.id,
                department_name: dept.name.clone(),
                owned_classrooms: count_u32(owned.len()),
                total_classes,
                own_room_usage,
                external_room_usage: total_classes - own_room_usage,
                average_owned_capacity,
                student_hours: classes.iter().map(|e| u64::from(e.enrolled)).sum(),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        a.department_name
            .cmp(&b.department_name)
            .then(a.department_id.cmp(&b.department_id))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoomStatus, RoomType};
    use chrono::NaiveTime;

    fn room(id: i64, department: Option<i64>, capacity: u32) -> Classroom {
        Classroom {
            id: ClassroomId::new(id),
            room_number: id.to_string(),
            building: "North".to_string(),
            floor: 0,
            capacity,
            room_type: RoomType::Seminar,
            department_id: department.map(DepartmentId::new),
            is_active: true,
            status: RoomStatus::Available,
        }
    }

    fn entry(id: i64, room: i64, dept: i64, slot: i64, enrolled: u32) -> UsageEntry {
        UsageEntry {
            entry_id: EntryId::new(id),
            classroom_id: ClassroomId::new(room),
            faculty_id: FacultyId::new(1),
            subject_id: SubjectId::new(dept * 10),
            subject_department_id: Some(DepartmentId::new(dept)),
            slot_id: TimeSlotId::new(slot),
            day: Weekday::Mon,
            enrolled,
        }
    }

    fn dept(id: i64, name: &str) -> Department {
        Department {
            id: DepartmentId::new(id),
            code: name[..2].to_uppercase(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_department_usage_splits_own_and_external() {
        let departments = vec![dept(1, "Physics"), dept(2, "Chemistry")];
        let rooms = vec![room(1, Some(1), 20), room(2, Some(1), 40), room(3, None, 100)];
        let entries = vec![
            entry(1, 1, 1, 1, 15),
            entry(2, 3, 1, 2, 60),
            entry(3, 2, 2, 1, 30),
        ];
        let rows = department_usage(&departments, &rooms, &entries);

        // ordered by name
        assert_eq!(rows[0].department_name, "Chemistry");
        assert_eq!(rows[0].owned_classrooms, 0);
        assert_eq!(rows[0].external_room_usage, 1);

        let physics = &rows[1];
        assert_eq!(physics.owned_classrooms, 2);
        assert_eq!(physics.total_classes, 2);
        assert_eq!(physics.own_room_usage, 1);
        assert_eq!(physics.external_room_usage, 1);
        assert_eq!(physics.average_owned_capacity, 30.0);
        assert_eq!(physics.student_hours, 75);
    }

    #[test]
    fn test_slot_usage_lists_every_slot() {
        let slots = vec![
            TimeSlot {
                id: TimeSlotId::new(2),
                day: Weekday::Tue,
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            },
            TimeSlot {
                id: TimeSlotId::new(1),
                day: Weekday::Mon,
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            },
        ];
        let entries = vec![entry(1, 1, 1, 1, 0), entry(2, 2, 1, 1, 0), entry(3, 2, 1, 1, 0)];
        let rows = slot_usage(&slots, &entries);
        assert_eq!(rows[0].slot_id, TimeSlotId::new(1));
        assert_eq!(rows[0].class_count, 3);
        assert_eq!(rows[0].rooms_in_use, 2);
        assert_eq!(rows[1].class_count, 0);
    }
}
