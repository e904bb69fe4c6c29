//! Catalog entities: departments, faculty, classrooms, time slots, subjects.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::define_id_type;

define_id_type!(DepartmentId);
define_id_type!(FacultyId);
define_id_type!(ClassroomId);
define_id_type!(TimeSlotId);
define_id_type!(SubjectId);

/// Physical classroom category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Lecture,
    Lab,
    Seminar,
    Auditorium,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Lecture => "lecture",
            RoomType::Lab => "lab",
            RoomType::Seminar => "seminar",
            RoomType::Auditorium => "auditorium",
        }
    }
}

/// Operational status of a classroom.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Available,
    Maintenance,
    Reserved,
    Closed,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Maintenance => "maintenance",
            RoomStatus::Reserved => "reserved",
            RoomStatus::Closed => "closed",
        }
    }
}

/// Employment status of a faculty member.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacultyStatus {
    Active,
    OnLeave,
    Inactive,
}

impl FacultyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacultyStatus::Active => "active",
            FacultyStatus::OnLeave => "on_leave",
            FacultyStatus::Inactive => "inactive",
        }
    }
}

/// Capacity facet used by the utilization report filters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityBand {
    /// Up to 30 seats.
    Small,
    /// 31 to 60 seats.
    Medium,
    /// More than 60 seats.
    Large,
}

impl CapacityBand {
    pub fn of(capacity: u32) -> Self {
        match capacity {
            0..=30 => CapacityBand::Small,
            31..=60 => CapacityBand::Medium,
            _ => CapacityBand::Large,
        }
    }

    pub fn contains(&self, capacity: u32) -> bool {
        Self::of(capacity) == *self
    }

    /// Inclusive seat bounds, `None` meaning unbounded.
    pub fn bounds(&self) -> (u32, Option<u32>) {
        match self {
            CapacityBand::Small => (0, Some(30)),
            CapacityBand::Medium => (31, Some(60)),
            CapacityBand::Large => (61, None),
        }
    }
}

impl std::str::FromStr for CapacityBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            _ => Err(format!("Unknown capacity band: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: FacultyId,
    pub name: String,
    pub department_id: DepartmentId,
    pub status: FacultyStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    pub id: ClassroomId,
    pub room_number: String,
    pub building: String,
    pub floor: i32,
    pub capacity: u32,
    pub room_type: RoomType,
    /// `None` means the room belongs to the shared pool.
    pub department_id: Option<DepartmentId>,
    pub is_active: bool,
    pub status: RoomStatus,
}

impl Classroom {
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.room_number, self.building)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: TimeSlotId,
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TimeSlot {
    /// e.g. `Monday 09:00-10:00`
    pub fn label(&self) -> String {
        format!(
            "{} {}-{}",
            weekday_name(self.day),
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }

    /// Ordering key: Monday first, then start time.
    pub fn sort_key(&self) -> (u32, NaiveTime, TimeSlotId) {
        (self.day.num_days_from_monday(), self.start_time, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub code: String,
    pub name: String,
    pub department_id: DepartmentId,
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_band_boundaries() {
        assert_eq!(CapacityBand::of(30), CapacityBand::Small);
        assert_eq!(CapacityBand::of(31), CapacityBand::Medium);
        assert_eq!(CapacityBand::of(60), CapacityBand::Medium);
        assert_eq!(CapacityBand::of(61), CapacityBand::Large);
        assert!(CapacityBand::Large.contains(200));
        assert!(!CapacityBand::Small.contains(45));
    }

    #[test]
    fn test_capacity_band_parse() {
        assert_eq!("Medium".parse::<CapacityBand>().unwrap(), CapacityBand::Medium);
        assert!("huge".parse::<CapacityBand>().is_err());
    }

    #[test]
    fn test_time_slot_label() {
        let slot = TimeSlot {
            id: TimeSlotId::new(1),
            day: Weekday::Mon,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        };
        assert_eq!(slot.label(), "Monday 09:00-10:00");
    }

    #[test]
    fn test_id_validity() {
        assert!(FacultyId::new(101).is_valid());
        assert!(!ClassroomId::new(0).is_valid());
        assert!(!TimeSlotId::new(-4).is_valid());
    }
}
