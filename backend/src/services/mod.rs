//! Service layer: the conflict validator and the utilization analyzer.
//!
//! Services are plain async functions generic over the repository traits.
//! They hold no state between calls; everything they need arrives as an
//! explicit argument, including the reference date of a reporting period.

pub mod conflict;
pub mod error;
pub mod utilization;
pub mod window;

pub use conflict::{capacity_warning, check_conflicts, check_conflicts_fail_closed, ConflictQuery};
pub use error::{EngineError, EngineResult, ResourceKind};
pub use utilization::{build_utilization_report, UtilizationQuery, WEEKLY_AVAILABLE_HOURS};
pub use window::{ReportingPeriod, ReportingWindow};
