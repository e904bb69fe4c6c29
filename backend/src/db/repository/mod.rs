//! Repository trait definitions for the engine's read queries.
//!
//! The engine never writes: every trait here is a set of named read queries.
//! Splitting them by concern keeps each implementation focused and lets
//! tests fake only the part they exercise.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`catalog`]: Lookups of faculty, classrooms, slots and departments
//! - [`timetable`]: Active-entry and enrollment queries used by conflict checks
//! - [`utilization`]: Aggregations behind the utilization report
//!
//! # Convenience Trait Bound
//!
//! ```ignore
//! async fn report<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let rooms = repo.list_classrooms(&ClassroomFilter::default()).await?;
//!     let slots = repo.list_time_slots().await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod timetable;
pub mod utilization;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use catalog::CatalogRepository;
pub use timetable::TimetableRepository;
pub use utilization::UtilizationRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all three
/// repository traits.
pub trait FullRepository: CatalogRepository + TimetableRepository + UtilizationRepository {}

impl<T> FullRepository for T where T: CatalogRepository + TimetableRepository + UtilizationRepository
{}
