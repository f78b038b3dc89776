use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::state::AppState;

use super::types::{LoadJobResponse, TargetQuery};
use super::{bigquery_err, ApiError};

/// GET /load_job/{job_id}/status. One status check, no waiting.
#[utoipa::path(
    get,
    path = "/load_job/{job_id}/status",
    tag = "Load Jobs",
    params(
        ("job_id" = String, Path, description = "Job id returned by an ingest call"),
        TargetQuery,
    ),
    responses(
        (status = 200, description = "Current job state", body = LoadJobResponse),
        (status = 404, description = "Job not found"),
        (status = 500, description = "BigQuery reported an unrecognised state"),
    )
)]
pub async fn load_job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    Query(target): Query<TargetQuery>,
) -> Result<Json<LoadJobResponse>, ApiError> {
    let project_id = target
        .project_id
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| state.defaults.project_id.clone());
    let region = target
        .region
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| state.defaults.region.clone());

    let report = state
        .jobs
        .poll_load_job_status(&job_id, &project_id, &region)
        .await
        .map_err(bigquery_err)?;

    Ok(Json(LoadJobResponse::new(&job_id, report.state, report.error_msg)))
}
