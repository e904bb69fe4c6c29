//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use super::dto::{
    ConflictCheckRequest, ConflictVerdict, HealthResponse, UtilizationParams, UtilizationReport,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::repository::CatalogRepository;
use crate::services::{self, EngineError};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// GET /health
///
/// Health check endpoint to verify the service is running and the database
/// is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

/// POST /v1/conflicts/check
///
/// Validate a proposed assignment. When the check cannot run the response is
/// 503 carrying a conflicting verdict, so clients that only read the body
/// still refuse to save.
pub async fn check_conflicts(
    State(state): State<AppState>,
    payload: Result<Json<ConflictCheckRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConflictVerdict>), AppError> {
    let Json(request) = payload?;
    match services::check_conflicts(state.repository.as_ref(), &request).await {
        Ok(verdict) => {
            info!(
                faculty_id = request.faculty_id,
                classroom_id = request.classroom_id,
                slot_id = request.slot_id,
                has_conflict = verdict.has_conflict,
                "Conflict check completed"
            );
            Ok((StatusCode::OK, Json(verdict)))
        }
        Err(err @ (EngineError::PrimaryCheckFailed(_) | EngineError::Repository(_))) => {
            warn!(error = %err, "Conflict check failed, reporting conflict");
            Ok((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ConflictVerdict::fail_closed(&err)),
            ))
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /v1/utilization/report
///
/// Classroom utilization report for a period and optional room filters.
pub async fn utilization_report(
    State(state): State<AppState>,
    params: Result<Query<UtilizationParams>, QueryRejection>,
) -> HandlerResult<UtilizationReport> {
    let Query(params) = params?;
    let query = params.to_query(state.today())?;
    let report = services::build_utilization_report(state.repository.as_ref(), &query).await?;
    if !report.unavailable_sections.is_empty() {
        warn!(
            sections = ?report.unavailable_sections,
            "Utilization report returned with degraded sections"
        );
    }
    Ok(Json(report))
}
