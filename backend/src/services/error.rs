//! Error taxonomy of the conflict validator and utilization analyzer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::TermError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Kind of resource that failed to resolve.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Faculty,
    Classroom,
    TimeSlot,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Faculty => "faculty",
            ResourceKind::Classroom => "classroom",
            ResourceKind::TimeSlot => "time slot",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed caller input. Always surfaced, never recovered.
    #[error("Invalid argument '{field}': {message}")]
    InvalidArgument {
        field: &'static str,
        message: String,
    },

    /// A referenced faculty, classroom or time slot does not exist.
    #[error("{resource} {id} not found")]
    ResourceNotFound { resource: ResourceKind, id: i64 },

    /// The conflict queries themselves failed. Callers must assume a conflict.
    #[error("Conflict check could not be completed: {0}")]
    PrimaryCheckFailed(#[source] RepositoryError),

    /// Advisory enrichment failed. Logged and degraded, never returned by
    /// the public entry points.
    #[error("Secondary computation '{stage}' failed: {source}")]
    SecondaryComputationFailure {
        stage: &'static str,
        #[source]
        source: RepositoryError,
    },

    /// Any other storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            message: message.into(),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            EngineError::ResourceNotFound { .. } => "RESOURCE_NOT_FOUND",
            EngineError::PrimaryCheckFailed(_) => "CONFLICT_CHECK_FAILED",
            EngineError::SecondaryComputationFailure { .. } => "SECONDARY_COMPUTATION_FAILED",
            EngineError::Repository(_) => "REPOSITORY_ERROR",
        }
    }
}

impl From<TermError> for EngineError {
    fn from(err: TermError) -> Self {
        let field = match err {
            TermError::NonPositiveSemester(_) | TermError::SemesterOutOfRange(_) => "semester",
            TermError::MalformedAcademicYear(_) => "academic_year",
        };
        EngineError::invalid(field, err.to_string())
    }
}

/// Log a failed enrichment query and drop its result.
pub(crate) fn advisory<T>(stage: &'static str, result: RepositoryResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(source) => {
            let err = EngineError::SecondaryComputationFailure { stage, source };
            log::warn!("{}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_errors_map_to_fields() {
        let err: EngineError = TermError::MalformedAcademicYear("2025".into()).into();
        match err {
            EngineError::InvalidArgument { field, .. } => assert_eq!(field, "academic_year"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_found_message() {
        let err = EngineError::ResourceNotFound {
            resource: ResourceKind::TimeSlot,
            id: 12,
        };
        assert_eq!(err.to_string(), "time slot 12 not found");
        assert_eq!(err.code(), "RESOURCE_NOT_FOUND");
    }

    #[test]
    fn test_advisory_degrades_errors() {
        assert_eq!(advisory("slot_popularity", Ok::<u32, _>(4)), Some(4));
        let failed: RepositoryResult<u32> = Err(RepositoryError::query("timeout"));
        assert_eq!(advisory("slot_popularity", failed), None);
    }
}
