//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data lives in
//! ordered maps so every query answers in a deterministic order.
//!
//! The repository can be seeded programmatically (`insert_*`), or loaded
//! from a JSON [`LocalSnapshot`]. Individual queries can be made to fail
//! with [`LocalRepository::fail_query`] to exercise degraded paths.

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;

use crate::db::models::*;
use crate::db::repository::catalog::missing;
use crate::db::repository::*;
use crate::db::usage::{self, UsageEntry};

/// Named queries of the local repository, used for fault injection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QueryKind {
    ResolveAssignment,
    ActiveEntries,
    DayEntries,
    SlotEntries,
    CountEnrolled,
    ListClassrooms,
    ListDepartments,
    ListTimeSlots,
    RoomOccupancy,
    WeeklySlotUsage,
    DepartmentUsage,
}

impl QueryKind {
    fn operation(&self) -> &'static str {
        match self {
            QueryKind::ResolveAssignment => "resolve_assignment",
            QueryKind::ActiveEntries => "list_active_entries",
            QueryKind::DayEntries => "list_day_entries",
            QueryKind::SlotEntries => "count_slot_entries",
            QueryKind::CountEnrolled => "count_enrolled",
            QueryKind::ListClassrooms => "list_classrooms",
            QueryKind::ListDepartments => "list_departments",
            QueryKind::ListTimeSlots => "list_time_slots",
            QueryKind::RoomOccupancy => "list_room_occupancy",
            QueryKind::WeeklySlotUsage => "aggregate_weekly_slot_usage",
            QueryKind::DepartmentUsage => "aggregate_department_usage",
        }
    }
}

/// Serializable dataset for seeding a [`LocalRepository`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalSnapshot {
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default)]
    pub faculty: Vec<Faculty>,
    #[serde(default)]
    pub classrooms: Vec<Classroom>,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub entries: Vec<TimetableEntry>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

/// In-memory local repository.
///
/// # Example
/// ```
/// use timetable_engine::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.entry_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    departments: BTreeMap<DepartmentId, Department>,
    faculty: BTreeMap<FacultyId, Faculty>,
    classrooms: BTreeMap<ClassroomId, Classroom>,
    time_slots: BTreeMap<TimeSlotId, TimeSlot>,
    subjects: BTreeMap<SubjectId, Subject>,
    entries: BTreeMap<EntryId, TimetableEntry>,
    enrollments: Vec<Enrollment>,

    // Fault injection
    failing: HashSet<QueryKind>,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            departments: BTreeMap::new(),
            faculty: BTreeMap::new(),
            classrooms: BTreeMap::new(),
            time_slots: BTreeMap::new(),
            subjects: BTreeMap::new(),
            entries: BTreeMap::new(),
            enrollments: Vec::new(),
            failing: HashSet::new(),
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn check(&self, query: QueryKind) -> RepositoryResult<()> {
        if !self.is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Database is not healthy",
                ErrorContext::new(query.operation()),
            ));
        }
        if self.failing.contains(&query) {
            return Err(RepositoryError::query_with_context(
                "Injected query failure",
                ErrorContext::new(query.operation()),
            ));
        }
        Ok(())
    }

    /// Join an entry with its catalog rows.
    ///
    /// Every active entry occupies its slot, so missing faculty, classroom or
    /// subject rows get placeholder labels instead of hiding the entry. A
    /// missing time slot leaves the entry without a day or time and is
    /// reported as a data error.
    fn detail(&self, entry: &TimetableEntry, operation: &str) -> RepositoryResult<EntryDetail> {
        let slot = self.slot_of(entry, operation)?;
        let faculty_name = self
            .faculty
            .get(&entry.faculty_id)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| placeholder("faculty", entry.faculty_id));
        let classroom_name = self
            .classrooms
            .get(&entry.classroom_id)
            .map(Classroom::display_name)
            .unwrap_or_else(|| placeholder("classroom", entry.classroom_id));
        let (subject_code, subject_name) = match self.subjects.get(&entry.subject_id) {
            Some(subject) => (subject.code.clone(), subject.name.clone()),
            None => {
                let label = placeholder("subject", entry.subject_id);
                (label.clone(), label)
            }
        };
        Ok(EntryDetail {
            entry_id: entry.id,
            faculty_id: entry.faculty_id,
            faculty_name,
            classroom_id: entry.classroom_id,
            classroom_name,
            slot_id: slot.id,
            day: slot.day,
            start_time: slot.start_time,
            end_time: slot.end_time,
            subject_id: entry.subject_id,
            subject_code,
            subject_name,
            section: entry.section.clone(),
        })
    }

    fn slot_of(&self, entry: &TimetableEntry, operation: &str) -> RepositoryResult<&TimeSlot> {
        self.time_slots.get(&entry.slot_id).ok_or_else(|| {
            RepositoryError::ValidationError {
                message: format!(
                    "Entry {} references unknown time slot {}",
                    entry.id, entry.slot_id
                ),
                context: ErrorContext::new(operation)
                    .with_entity("timetable_entry")
                    .with_entity_id(entry.id),
            }
        })
    }

    fn enrolled(
        &self,
        subject_id: SubjectId,
        section: &str,
        term: &Term,
        status: EnrollmentStatus,
    ) -> u32 {
        let count = self
            .enrollments
            .iter()
            .filter(|e| {
                e.subject_id == subject_id
                    && e.section == section
                    && e.term == *term
                    && e.status == status
            })
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Scheduled entries of the filtered room population.
    ///
    /// Entries with an unknown subject are counted without a department.
    fn usage(
        &self,
        filter: &UsageFilter,
        operation: &str,
    ) -> RepositoryResult<(Vec<Classroom>, Vec<UsageEntry>)> {
        let rooms: Vec<Classroom> = self
            .classrooms
            .values()
            .filter(|room| filter.rooms.matches(room))
            .cloned()
            .collect();
        let room_ids: BTreeSet<ClassroomId> = rooms.iter().map(|r| r.id).collect();
        let entries = self
            .entries
            .values()
            .filter(|e| filter.includes_entry(e) && room_ids.contains(&e.classroom_id))
            .map(|e| -> RepositoryResult<UsageEntry> {
                let slot = self.slot_of(e, operation)?;
                Ok(UsageEntry {
                    entry_id: e.id,
                    classroom_id: e.classroom_id,
                    faculty_id: e.faculty_id,
                    subject_id: e.subject_id,
                    subject_department_id: self.subjects.get(&e.subject_id).map(|s| s.department_id),
                    slot_id: e.slot_id,
                    day: slot.day,
                    enrolled: self.enrolled(
                        e.subject_id,
                        &e.section,
                        &e.term,
                        EnrollmentStatus::Enrolled,
                    ),
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;
        Ok((rooms, entries))
    }
}

/// Label shown for a row referenced by an entry but absent from the catalog.
fn placeholder(entity: &str, id: impl std::fmt::Display) -> String {
    format!("{} #{}", entity, id)
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Create a repository pre-populated with a snapshot.
    pub fn from_snapshot(snapshot: LocalSnapshot) -> Self {
        let repo = Self::new();
        repo.load(snapshot);
        repo
    }

    /// Load a JSON snapshot file.
    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read snapshot {}: {}",
                path.display(),
                e
            ))
        })?;
        let snapshot: LocalSnapshot = serde_json::from_str(&content).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to parse snapshot {}: {}",
                path.display(),
                e
            ))
        })?;
        info!(
            "Loaded local snapshot from {} ({} classrooms, {} entries)",
            path.display(),
            snapshot.classrooms.len(),
            snapshot.entries.len()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Merge a snapshot into the repository. Rows with existing ids are replaced.
    pub fn load(&self, snapshot: LocalSnapshot) {
        let mut data = self.data.write();
        for d in snapshot.departments {
            data.departments.insert(d.id, d);
        }
        for f in snapshot.faculty {
            data.faculty.insert(f.id, f);
        }
        for c in snapshot.classrooms {
            data.classrooms.insert(c.id, c);
        }
        for s in snapshot.time_slots {
            data.time_slots.insert(s.id, s);
        }
        for s in snapshot.subjects {
            data.subjects.insert(s.id, s);
        }
        for e in snapshot.entries {
            data.entries.insert(e.id, e);
        }
        data.enrollments.extend(snapshot.enrollments);
    }

    /// Export the current contents.
    pub fn snapshot(&self) -> LocalSnapshot {
        let data = self.data.read();
        LocalSnapshot {
            departments: data.departments.values().cloned().collect(),
            faculty: data.faculty.values().cloned().collect(),
            classrooms: data.classrooms.values().cloned().collect(),
            time_slots: data.time_slots.values().cloned().collect(),
            subjects: data.subjects.values().cloned().collect(),
            entries: data.entries.values().cloned().collect(),
            enrollments: data.enrollments.clone(),
        }
    }

    pub fn insert_department(&self, department: Department) {
        self.data.write().departments.insert(department.id, department);
    }

    pub fn insert_faculty(&self, faculty: Faculty) {
        self.data.write().faculty.insert(faculty.id, faculty);
    }

    pub fn insert_classroom(&self, classroom: Classroom) {
        self.data.write().classrooms.insert(classroom.id, classroom);
    }

    pub fn insert_time_slot(&self, slot: TimeSlot) {
        self.data.write().time_slots.insert(slot.id, slot);
    }

    pub fn insert_subject(&self, subject: Subject) {
        self.data.write().subjects.insert(subject.id, subject);
    }

    /// Insert or replace a timetable entry.
    ///
    /// No uniqueness is enforced here: tests use this to build states the
    /// validator must then judge.
    pub fn insert_entry(&self, entry: TimetableEntry) {
        self.data.write().entries.insert(entry.id, entry);
    }

    pub fn insert_enrollment(&self, enrollment: Enrollment) {
        self.data.write().enrollments.push(enrollment);
    }

    /// Soft-delete an entry. Returns `false` if the id is unknown.
    pub fn deactivate_entry(&self, id: EntryId) -> bool {
        match self.data.write().entries.get_mut(&id) {
            Some(entry) => {
                entry.is_active = false;
                true
            }
            None => false,
        }
    }

    /// Remove enrollments of a subject section, e.g. to simulate drops
    /// between two calls.
    pub fn remove_enrollments(&self, subject_id: SubjectId, section: &str) -> usize {
        let mut data = self.data.write();
        let before = data.enrollments.len();
        data.enrollments
            .retain(|e| !(e.subject_id == subject_id && e.section == section));
        before - data.enrollments.len()
    }

    /// Make a query fail until [`clear_failures`](Self::clear_failures) is called.
    pub fn fail_query(&self, query: QueryKind) {
        self.data.write().failing.insert(query);
    }

    pub fn clear_failures(&self) {
        self.data.write().failing.clear();
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    pub fn entry_count(&self) -> usize {
        self.data.read().entries.len()
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn find_faculty(&self, id: FacultyId) -> RepositoryResult<Faculty> {
        let data = self.data.read();
        data.check(QueryKind::ResolveAssignment)?;
        data.faculty
            .get(&id)
            .cloned()
            .ok_or_else(|| missing("faculty", id, "find_faculty"))
    }

    async fn find_classroom(&self, id: ClassroomId) -> RepositoryResult<Classroom> {
        let data = self.data.read();
        data.check(QueryKind::ResolveAssignment)?;
        data.classrooms
            .get(&id)
            .cloned()
            .ok_or_else(|| missing("classroom", id, "find_classroom"))
    }

    async fn find_time_slot(&self, id: TimeSlotId) -> RepositoryResult<TimeSlot> {
        let data = self.data.read();
        data.check(QueryKind::ResolveAssignment)?;
        data.time_slots
            .get(&id)
            .cloned()
            .ok_or_else(|| missing("time_slot", id, "find_time_slot"))
    }

    async fn resolve_assignment(
        &self,
        faculty_id: FacultyId,
        classroom_id: ClassroomId,
        slot_id: TimeSlotId,
    ) -> RepositoryResult<ResolvedAssignment> {
        let data = self.data.read();
        data.check(QueryKind::ResolveAssignment)?;
        let faculty = data
            .faculty
            .get(&faculty_id)
            .cloned()
            .ok_or_else(|| missing("faculty", faculty_id, "resolve_assignment"))?;
        let classroom = data
            .classrooms
            .get(&classroom_id)
            .cloned()
            .ok_or_else(|| missing("classroom", classroom_id, "resolve_assignment"))?;
        let slot = data
            .time_slots
            .get(&slot_id)
            .cloned()
            .ok_or_else(|| missing("time_slot", slot_id, "resolve_assignment"))?;
        Ok(ResolvedAssignment {
            faculty,
            classroom,
            slot,
        })
    }

    async fn list_classrooms(&self, filter: &ClassroomFilter) -> RepositoryResult<Vec<Classroom>> {
        let data = self.data.read();
        data.check(QueryKind::ListClassrooms)?;
        Ok(data
            .classrooms
            .values()
            .filter(|room| filter.matches(room))
            .cloned()
            .collect())
    }

    async fn list_departments(&self) -> RepositoryResult<Vec<Department>> {
        let data = self.data.read();
        data.check(QueryKind::ListDepartments)?;
        Ok(data.departments.values().cloned().collect())
    }

    async fn list_time_slots(&self) -> RepositoryResult<Vec<TimeSlot>> {
        let data = self.data.read();
        data.check(QueryKind::ListTimeSlots)?;
        let mut slots: Vec<TimeSlot> = data.time_slots.values().cloned().collect();
        slots.sort_by_key(TimeSlot::sort_key);
        Ok(slots)
    }
}

#[async_trait]
impl TimetableRepository for LocalRepository {
    async fn list_active_entries(&self, filter: &EntryFilter) -> RepositoryResult<Vec<EntryDetail>> {
        let data = self.data.read();
        data.check(QueryKind::ActiveEntries)?;
        let rows: Vec<EntryDetail> = data
            .entries
            .values()
            .filter(|e| filter.matches(e))
            .map(|e| data.detail(e, QueryKind::ActiveEntries.operation()))
            .collect::<RepositoryResult<_>>()?;
        debug!(
            "list_active_entries: {} row(s) for term {}",
            rows.len(),
            filter.term
        );
        Ok(rows)
    }

    async fn list_day_entries(&self, query: &DayQuery) -> RepositoryResult<Vec<EntryDetail>> {
        let data = self.data.read();
        data.check(QueryKind::DayEntries)?;
        let mut rows: Vec<EntryDetail> = data
            .entries
            .values()
            .filter(|e| e.is_active && e.term == query.term && query.resource.matches(e))
            .filter(|e| query.exclude_slot != Some(e.slot_id))
            .map(|e| data.detail(e, QueryKind::DayEntries.operation()))
            .collect::<RepositoryResult<Vec<_>>>()?;
        rows.retain(|d| d.day == query.day);
        rows.sort_by_key(|d| (d.start_time, d.entry_id));
        Ok(rows)
    }

    async fn count_slot_entries(
        &self,
        slot_id: TimeSlotId,
        term: &Term,
        exclude_id: Option<EntryId>,
    ) -> RepositoryResult<u32> {
        let data = self.data.read();
        data.check(QueryKind::SlotEntries)?;
        let filter = EntryFilter::new(*term)
            .with_slot(slot_id)
            .excluding(exclude_id);
        Ok(count_u32(
            data.entries.values().filter(|e| filter.matches(e)).count(),
        ))
    }

    async fn count_enrolled(
        &self,
        subject_id: SubjectId,
        section: &str,
        term: &Term,
        status: EnrollmentStatus,
    ) -> RepositoryResult<u32> {
        let data = self.data.read();
        data.check(QueryKind::CountEnrolled)?;
        Ok(data.enrolled(subject_id, section, term, status))
    }
}

#[async_trait]
impl UtilizationRepository for LocalRepository {
    async fn list_room_occupancy(
        &self,
        filter: &UsageFilter,
    ) -> RepositoryResult<Vec<RoomOccupancyRow>> {
        let data = self.data.read();
        data.check(QueryKind::RoomOccupancy)?;
        let (_, entries) = data.usage(filter, QueryKind::RoomOccupancy.operation())?;
        Ok(usage::occupancy_rows(&entries))
    }

    async fn aggregate_weekly_slot_usage(
        &self,
        filter: &UsageFilter,
    ) -> RepositoryResult<Vec<SlotUsageRow>> {
        let data = self.data.read();
        data.check(QueryKind::WeeklySlotUsage)?;
        let (_, entries) = data.usage(filter, QueryKind::WeeklySlotUsage.operation())?;
        let slots: Vec<TimeSlot> = data.time_slots.values().cloned().collect();
        Ok(usage::slot_usage(&slots, &entries))
    }

    async fn aggregate_department_usage(
        &self,
        filter: &UsageFilter,
    ) -> RepositoryResult<Vec<DepartmentUsageRow>> {
        let data = self.data.read();
        data.check(QueryKind::DepartmentUsage)?;
        let (rooms, entries) = data.usage(filter, QueryKind::DepartmentUsage.operation())?;
        let departments: Vec<Department> = data.departments.values().cloned().collect();
        Ok(usage::department_usage(&departments, &rooms, &entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Weekday};

    fn term() -> Term {
        Term::parse(1, "2025-2026").unwrap()
    }

    fn seeded() -> LocalRepository {
        let repo = LocalRepository::new();
        repo.insert_department(Department {
            id: DepartmentId::new(1),
            code: "CS".into(),
            name: "Computer Science".into(),
        });
        repo.insert_faculty(Faculty {
            id: FacultyId::new(10),
            name: "Ada Lovelace".into(),
            department_id: DepartmentId::new(1),
            status: crate::models::FacultyStatus::Active,
        });
        repo.insert_classroom(Classroom {
            id: ClassroomId::new(5),
            room_number: "101".into(),
            building: "Main".into(),
            floor: 1,
            capacity: 30,
            room_type: crate::models::RoomType::Lecture,
            department_id: Some(DepartmentId::new(1)),
            is_active: true,
            status: crate::models::RoomStatus::Available,
        });
        repo.insert_time_slot(TimeSlot {
            id: TimeSlotId::new(1),
            day: Weekday::Mon,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        });
        repo.insert_subject(Subject {
            id: SubjectId::new(3),
            code: "CS101".into(),
            name: "Programming".into(),
            department_id: DepartmentId::new(1),
        });
        repo.insert_entry(TimetableEntry {
            id: EntryId::new(1),
            faculty_id: FacultyId::new(10),
            classroom_id: ClassroomId::new(5),
            slot_id: TimeSlotId::new(1),
            subject_id: SubjectId::new(3),
            section: "A".into(),
            term: term(),
            is_active: true,
            created_at: NaiveDate::from_ymd_opt(2025, 9, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        });
        repo
    }

    #[tokio::test]
    async fn test_soft_deleted_entries_are_invisible() {
        let repo = seeded();
        let filter = EntryFilter::new(term()).with_faculty(FacultyId::new(10));
        assert_eq!(repo.list_active_entries(&filter).await.unwrap().len(), 1);

        assert!(repo.deactivate_entry(EntryId::new(1)));
        assert!(repo.list_active_entries(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detail_joins_display_names() {
        let repo = seeded();
        let rows = repo
            .list_active_entries(&EntryFilter::new(term()).with_slot(TimeSlotId::new(1)))
            .await
            .unwrap();
        assert_eq!(rows[0].classroom_name, "101 (Main)");
        assert_eq!(rows[0].subject_label(), "CS101 (Programming) section A");
    }

    #[tokio::test]
    async fn test_resolve_reports_missing_resource() {
        let repo = seeded();
        let err = repo
            .resolve_assignment(FacultyId::new(10), ClassroomId::new(99), TimeSlotId::new(1))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.context().entity.as_deref(), Some("classroom"));
    }

    #[tokio::test]
    async fn test_injected_failure_targets_one_query() {
        let repo = seeded();
        repo.fail_query(QueryKind::CountEnrolled);
        assert!(repo
            .count_enrolled(SubjectId::new(3), "A", &term(), EnrollmentStatus::Enrolled)
            .await
            .is_err());
        assert!(repo
            .count_slot_entries(TimeSlotId::new(1), &term(), None)
            .await
            .is_ok());

        repo.clear_failures();
        assert!(repo
            .count_enrolled(SubjectId::new(3), "A", &term(), EnrollmentStatus::Enrolled)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_unhealthy_repository_fails_queries() {
        let repo = seeded();
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.list_time_slots().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_rows() {
        let repo = seeded();
        let json = serde_json::to_string(&repo.snapshot()).unwrap();
        let restored: LocalSnapshot = serde_json::from_str(&json).unwrap();
        let copy = LocalRepository::from_snapshot(restored);
        assert_eq!(copy.entry_count(), 1);
        assert_eq!(copy.snapshot(), repo.snapshot());
    }
}
