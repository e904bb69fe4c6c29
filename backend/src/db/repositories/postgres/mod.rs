//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres database
//! following the schema in `migrations/`. The migration also creates the
//! partial unique indexes that enforce faculty and classroom exclusivity
//! among active entries of a term, which is the authoritative guard against
//! two concurrent writers passing the same conflict check.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::NaiveTime;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;

use crate::db::models::*;
use crate::db::repository::catalog::missing;
use crate::db::repository::{
    CatalogRepository, ErrorContext, RepositoryError, RepositoryResult, TimetableRepository,
    UtilizationRepository,
};
use crate::db::usage::{self, UsageEntry};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// See the module documentation for the variables read and their defaults.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

/// Optional filters of the active-entry join.
#[derive(Debug, Clone, Default)]
struct DetailQuery {
    semester: i32,
    academic_year: String,
    faculty_id: Option<i64>,
    classroom_id: Option<i64>,
    slot_id: Option<i64>,
    exclude_id: Option<i64>,
    day_of_week: Option<i16>,
    exclude_slot: Option<i64>,
}

impl DetailQuery {
    fn for_term(term: &Term) -> Self {
        let (semester, academic_year) = term_to_db(term);
        Self {
            semester,
            academic_year,
            ..Default::default()
        }
    }
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// This blocks while the pool is built; use
    /// [`RepositoryFactory::create_postgres`](crate::db::RepositoryFactory::create_postgres)
    /// from async code.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }
        info!(
            "Postgres repository ready (pool max_size={})",
            config.max_pool_size
        );

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// The operation runs on the blocking pool and is retried up to
    /// `max_retries` times with exponential backoff while it fails with a
    /// retryable error.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    debug!("Retrying {} (attempt {})", operation, attempt + 1);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new(operation)
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e.with_operation(operation));
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Returns (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        match self.health_check().await {
            Ok(true) => (true, Some(start.elapsed().as_millis() as u64), None),
            Ok(false) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some("Health check returned false".to_string()),
            ),
            Err(e) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some(e.to_string()),
            ),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn load_entry_details(
    conn: &mut PgConnection,
    q: &DetailQuery,
) -> RepositoryResult<Vec<EntryDetail>> {
    let mut query = timetable_entries::table
        .inner_join(faculty::table)
        .inner_join(classrooms::table)
        .inner_join(time_slots::table)
        .inner_join(subjects::table)
        .filter(timetable_entries::is_active.eq(true))
        .filter(timetable_entries::semester.eq(q.semester))
        .filter(timetable_entries::academic_year.eq(q.academic_year.clone()))
        .into_boxed();

    if let Some(id) = q.faculty_id {
        query = query.filter(timetable_entries::faculty_id.eq(id));
    }
    if let Some(id) = q.classroom_id {
        query = query.filter(timetable_entries::classroom_id.eq(id));
    }
    if let Some(id) = q.slot_id {
        query = query.filter(timetable_entries::slot_id.eq(id));
    }
    if let Some(id) = q.exclude_id {
        query = query.filter(timetable_entries::id.ne(id));
    }
    if let Some(day) = q.day_of_week {
        query = query.filter(time_slots::day_of_week.eq(day));
    }
    if let Some(id) = q.exclude_slot {
        query = query.filter(timetable_entries::slot_id.ne(id));
    }

    let rows = query
        .order(timetable_entries::id.asc())
        .select((
            EntryRow::as_select(),
            FacultyRow::as_select(),
            ClassroomRow::as_select(),
            TimeSlotRow::as_select(),
            SubjectRow::as_select(),
        ))
        .load::<EntryJoinRow>(conn)
        .map_err(map_diesel_error)?;

    rows.into_iter().map(entry_detail).collect()
}

fn load_classrooms(conn: &mut PgConnection, filter: &ClassroomFilter) -> RepositoryResult<Vec<Classroom>> {
    let mut query = classrooms::table
        .filter(classrooms::is_active.eq(true))
        .into_boxed();
    if let Some(building) = &filter.building {
        query = query.filter(classrooms::building.eq(building.clone()));
    }
    if let Some(floor) = filter.floor {
        query = query.filter(classrooms::floor.eq(floor));
    }
    if let Some(department) = filter.department_id {
        query = query.filter(classrooms::department_id.eq(department.value()));
    }
    let rows = query
        .order(classrooms::id.asc())
        .select(ClassroomRow::as_select())
        .load::<ClassroomRow>(conn)
        .map_err(map_diesel_error)?;

    let mut rooms = Vec::with_capacity(rows.len());
    for row in rows {
        let room = row.into_domain()?;
        // capacity bands are applied here rather than in SQL
        if filter.matches(&room) {
            rooms.push(room);
        }
    }
    Ok(rooms)
}

fn load_time_slots(conn: &mut PgConnection) -> RepositoryResult<Vec<TimeSlot>> {
    let rows = time_slots::table
        .order((time_slots::day_of_week.asc(), time_slots::start_time.asc()))
        .select(TimeSlotRow::as_select())
        .load::<TimeSlotRow>(conn)
        .map_err(map_diesel_error)?;
    rows.into_iter().map(TimeSlotRow::into_domain).collect()
}

fn load_departments(conn: &mut PgConnection) -> RepositoryResult<Vec<Department>> {
    let rows = departments::table
        .order(departments::id.asc())
        .select(DepartmentRow::as_select())
        .load::<DepartmentRow>(conn)
        .map_err(map_diesel_error)?;
    Ok(rows.into_iter().map(Department::from).collect())
}

type SectionKey = (i64, String, i32, String);

/// Enrolled-student counts per (subject, section, semester, academic year).
fn load_enrolled_counts(conn: &mut PgConnection) -> RepositoryResult<BTreeMap<SectionKey, u32>> {
    let rows = enrollments::table
        .filter(enrollments::status.eq(EnrollmentStatus::Enrolled.as_str()))
        .group_by((
            enrollments::subject_id,
            enrollments::section,
            enrollments::semester,
            enrollments::academic_year,
        ))
        .select((
            enrollments::subject_id,
            enrollments::section,
            enrollments::semester,
            enrollments::academic_year,
            diesel::dsl::count_star(),
        ))
        .load::<(i64, String, i32, String, i64)>(conn)
        .map_err(map_diesel_error)?;
    Ok(rows
        .into_iter()
        .map(|(subject, section, semester, year, count)| {
            (
                (subject, section, semester, year),
                u32::try_from(count).unwrap_or(u32::MAX),
            )
        })
        .collect())
}

/// Rooms and scheduled entries behind the utilization aggregates.
fn load_usage(
    conn: &mut PgConnection,
    filter: &UsageFilter,
) -> RepositoryResult<(Vec<Classroom>, Vec<UsageEntry>)> {
    let rooms = load_classrooms(conn, &filter.rooms)?;
    let room_ids: Vec<i64> = rooms.iter().map(|r| r.id.value()).collect();

    let mut query = timetable_entries::table
        .inner_join(time_slots::table)
        .left_join(subjects::table)
        .filter(timetable_entries::is_active.eq(true))
        .filter(timetable_entries::classroom_id.eq_any(room_ids))
        .filter(timetable_entries::created_at.ge(filter.window.start.and_time(NaiveTime::MIN)))
        .into_boxed();
    if let Some(term) = &filter.term {
        let (semester, academic_year) = term_to_db(term);
        query = query
            .filter(timetable_entries::semester.eq(semester))
            .filter(timetable_entries::academic_year.eq(academic_year));
    }
    let rows = query
        .order(timetable_entries::id.asc())
        .select((
            EntryRow::as_select(),
            TimeSlotRow::as_select(),
            subjects::department_id.nullable(),
        ))
        .load::<(EntryRow, TimeSlotRow, Option<i64>)>(conn)
        .map_err(map_diesel_error)?;

    let enrolled = load_enrolled_counts(conn)?;

    let mut entries = Vec::with_capacity(rows.len());
    for (entry, slot, subject_department) in rows {
        let key: SectionKey = (
            entry.subject_id,
            entry.section.clone(),
            entry.semester,
            entry.academic_year.clone(),
        );
        let entry = entry.into_domain()?;
        // the window end is checked on the calendar date
        if !filter.includes_entry(&entry) {
            continue;
        }
        entries.push(UsageEntry {
            entry_id: entry.id,
            classroom_id: entry.classroom_id,
            faculty_id: entry.faculty_id,
            subject_id: entry.subject_id,
            subject_department_id: subject_department.map(DepartmentId::new),
            slot_id: entry.slot_id,
            day: weekday_from_db(slot.day_of_week)?,
            enrolled: enrolled.get(&key).copied().unwrap_or(0),
        });
    }
    Ok((rooms, entries))
}

#[async_trait]
impl CatalogRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn find_faculty(&self, id: FacultyId) -> RepositoryResult<Faculty> {
        self.with_conn("find_faculty", move |conn| {
            faculty::table
                .find(id.value())
                .select(FacultyRow::as_select())
                .first::<FacultyRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| missing("faculty", id, "find_faculty"))?
                .into_domain()
        })
        .await
    }

    async fn find_classroom(&self, id: ClassroomId) -> RepositoryResult<Classroom> {
        self.with_conn("find_classroom", move |conn| {
            classrooms::table
                .find(id.value())
                .select(ClassroomRow::as_select())
                .first::<ClassroomRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| missing("classroom", id, "find_classroom"))?
                .into_domain()
        })
        .await
    }

    async fn find_time_slot(&self, id: TimeSlotId) -> RepositoryResult<TimeSlot> {
        self.with_conn("find_time_slot", move |conn| {
            time_slots::table
                .find(id.value())
                .select(TimeSlotRow::as_select())
                .first::<TimeSlotRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| missing("time_slot", id, "find_time_slot"))?
                .into_domain()
        })
        .await
    }

    async fn resolve_assignment(
        &self,
        faculty_id: FacultyId,
        classroom_id: ClassroomId,
        slot_id: TimeSlotId,
    ) -> RepositoryResult<ResolvedAssignment> {
        self.with_conn("resolve_assignment", move |conn| {
            let faculty = faculty::table
                .find(faculty_id.value())
                .select(FacultyRow::as_select())
                .first::<FacultyRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| missing("faculty", faculty_id, "resolve_assignment"))?
                .into_domain()?;
            let classroom = classrooms::table
                .find(classroom_id.value())
                .select(ClassroomRow::as_select())
                .first::<ClassroomRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| missing("classroom", classroom_id, "resolve_assignment"))?
                .into_domain()?;
            let slot = time_slots::table
                .find(slot_id.value())
                .select(TimeSlotRow::as_select())
                .first::<TimeSlotRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| missing("time_slot", slot_id, "resolve_assignment"))?
                .into_domain()?;
            Ok(ResolvedAssignment {
                faculty,
                classroom,
                slot,
            })
        })
        .await
    }

    async fn list_classrooms(&self, filter: &ClassroomFilter) -> RepositoryResult<Vec<Classroom>> {
        let filter = filter.clone();
        self.with_conn("list_classrooms", move |conn| load_classrooms(conn, &filter))
            .await
    }

    async fn list_departments(&self) -> RepositoryResult<Vec<Department>> {
        self.with_conn("list_departments", load_departments).await
    }

    async fn list_time_slots(&self) -> RepositoryResult<Vec<TimeSlot>> {
        self.with_conn("list_time_slots", load_time_slots).await
    }
}

#[async_trait]
impl TimetableRepository for PostgresRepository {
    async fn list_active_entries(&self, filter: &EntryFilter) -> RepositoryResult<Vec<EntryDetail>> {
        let query = DetailQuery {
            faculty_id: filter.faculty_id.map(|id| id.value()),
            classroom_id: filter.classroom_id.map(|id| id.value()),
            slot_id: filter.slot_id.map(|id| id.value()),
            exclude_id: filter.exclude_id.map(|id| id.value()),
            ..DetailQuery::for_term(&filter.term)
        };
        self.with_conn("list_active_entries", move |conn| {
            load_entry_details(conn, &query)
        })
        .await
    }

    async fn list_day_entries(&self, day: &DayQuery) -> RepositoryResult<Vec<EntryDetail>> {
        let (faculty_id, classroom_id) = match day.resource {
            ResourceRef::Faculty(id) => (Some(id.value()), None),
            ResourceRef::Classroom(id) => (None, Some(id.value())),
        };
        let query = DetailQuery {
            faculty_id,
            classroom_id,
            day_of_week: Some(weekday_to_db(day.day)),
            exclude_slot: day.exclude_slot.map(|id| id.value()),
            ..DetailQuery::for_term(&day.term)
        };
        let mut rows = self
            .with_conn("list_day_entries", move |conn| {
                load_entry_details(conn, &query)
            })
            .await?;
        rows.sort_by_key(|d| (d.start_time, d.entry_id));
        Ok(rows)
    }

    async fn count_slot_entries(
        &self,
        slot_id: TimeSlotId,
        term: &Term,
        exclude_id: Option<EntryId>,
    ) -> RepositoryResult<u32> {
        let (semester, academic_year) = term_to_db(term);
        self.with_conn("count_slot_entries", move |conn| {
            let mut query = timetable_entries::table
                .filter(timetable_entries::is_active.eq(true))
                .filter(timetable_entries::slot_id.eq(slot_id.value()))
                .filter(timetable_entries::semester.eq(semester))
                .filter(timetable_entries::academic_year.eq(academic_year.clone()))
                .into_boxed();
            if let Some(id) = exclude_id {
                query = query.filter(timetable_entries::id.ne(id.value()));
            }
            let count: i64 = query
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(u32::try_from(count).unwrap_or(u32::MAX))
        })
        .await
    }

    async fn count_enrolled(
        &self,
        subject_id: SubjectId,
        section: &str,
        term: &Term,
        status: EnrollmentStatus,
    ) -> RepositoryResult<u32> {
        let (semester, academic_year) = term_to_db(term);
        let section = section.to_string();
        self.with_conn("count_enrolled", move |conn| {
            let count: i64 = enrollments::table
                .filter(enrollments::subject_id.eq(subject_id.value()))
                .filter(enrollments::section.eq(section.clone()))
                .filter(enrollments::semester.eq(semester))
                .filter(enrollments::academic_year.eq(academic_year.clone()))
                .filter(enrollments::status.eq(status.as_str()))
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(u32::try_from(count).unwrap_or(u32::MAX))
        })
        .await
    }
}

#[async_trait]
impl UtilizationRepository for PostgresRepository {
    async fn list_room_occupancy(
        &self,
        filter: &UsageFilter,
    ) -> RepositoryResult<Vec<RoomOccupancyRow>> {
        let filter = filter.clone();
        self.with_conn("list_room_occupancy", move |conn| {
            let (_, entries) = load_usage(conn, &filter)?;
            Ok(usage::occupancy_rows(&entries))
        })
        .await
    }

    async fn aggregate_weekly_slot_usage(
        &self,
        filter: &UsageFilter,
    ) -> RepositoryResult<Vec<SlotUsageRow>> {
        let filter = filter.clone();
        self.with_conn("aggregate_weekly_slot_usage", move |conn| {
            let slots = load_time_slots(conn)?;
            let (_, entries) = load_usage(conn, &filter)?;
            Ok(usage::slot_usage(&slots, &entries))
        })
        .await
    }

    async fn aggregate_department_usage(
        &self,
        filter: &UsageFilter,
    ) -> RepositoryResult<Vec<DepartmentUsageRow>> {
        let filter = filter.clone();
        self.with_conn("aggregate_department_usage", move |conn| {
            let departments = load_departments(conn)?;
            let (rooms, entries) = load_usage(conn, &filter)?;
            Ok(usage::department_usage(&departments, &rooms, &entries))
        })
        .await
    }
}
