//! Data Transfer Objects for the HTTP API.
//!
//! Request and report bodies are re-exported from the api module since they
//! already derive Serialize/Deserialize.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::api::{ConflictCheckRequest, ConflictVerdict, UtilizationReport};
use crate::models::{CapacityBand, DepartmentId, Term};
use crate::db::models::ClassroomFilter;
use crate::services::window::{ReportingPeriod, ReportingWindow};
use crate::services::{EngineError, EngineResult, UtilizationQuery};

/// Query parameters for the utilization report endpoint.
///
/// Either `period` or an explicit `start`/`end` pair selects the window;
/// `period` defaults to the current semester.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UtilizationParams {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub department_id: Option<i64>,
    /// Capacity band: small, medium or large
    #[serde(default)]
    pub capacity: Option<String>,
    #[serde(default)]
    pub semester: Option<i64>,
    #[serde(default)]
    pub academic_year: Option<String>,
}

impl UtilizationParams {
    /// Resolve the parameters into a report query.
    pub fn to_query(&self, today: NaiveDate) -> EngineResult<UtilizationQuery> {
        let mut query = match (self.start, self.end) {
            (Some(start), Some(end)) => {
                if self.period.is_some() {
                    return Err(EngineError::invalid(
                        "period",
                        "period cannot be combined with start/end",
                    ));
                }
                let window = ReportingWindow::new(start, end)
                    .ok_or_else(|| EngineError::invalid("start", "start is after end"))?;
                UtilizationQuery::for_window(window)
            }
            (None, None) => {
                let period = match &self.period {
                    Some(raw) => raw
                        .parse::<ReportingPeriod>()
                        .map_err(|e| EngineError::invalid("period", e))?,
                    None => ReportingPeriod::CurrentSemester,
                };
                UtilizationQuery::for_period(period, today)
            }
            _ => {
                return Err(EngineError::invalid(
                    "start",
                    "start and end must be given together",
                ))
            }
        };

        let department_id = match self.department_id {
            Some(id) if id <= 0 => {
                return Err(EngineError::invalid("department_id", "must be positive"))
            }
            other => other.map(DepartmentId::new),
        };
        let capacity_band = self
            .capacity
            .as_deref()
            .map(|raw| raw.parse::<CapacityBand>())
            .transpose()
            .map_err(|e| EngineError::invalid("capacity", e))?;
        query = query.with_rooms(ClassroomFilter {
            building: self
                .building
                .as_ref()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
            floor: self.floor,
            department_id,
            capacity_band,
        });

        let term = match (self.semester, self.academic_year.as_deref()) {
            (Some(semester), Some(year)) => Some(Term::parse(semester, year)?),
            (None, None) => None,
            (Some(_), None) => {
                return Err(EngineError::invalid(
                    "academic_year",
                    "required when semester is given",
                ))
            }
            (None, Some(_)) => {
                return Err(EngineError::invalid(
                    "semester",
                    "required when academic_year is given",
                ))
            }
        };

        Ok(query.with_term(term))
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}
