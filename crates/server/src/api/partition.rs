//! Partition existence checks and ingestion.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::info;

use hourload_bigquery::PartitionLoadRequest;
use hourload_core::PartitionKey;

use crate::state::AppState;

use super::types::{BucketQuery, LoadJobResponse, NewLoadJob, TargetQuery};
use super::{bigquery_err, parse_partition, storage_err, ApiError};

fn last_hour_partition() -> PartitionKey {
    let partition = PartitionKey::last_hour(Utc::now());
    info!(partition = %partition, "Last hour partition");
    partition
}

async fn exists_in_bucket(
    state: &AppState,
    bucket: &str,
    partition: PartitionKey,
) -> Result<Json<u8>, ApiError> {
    let found = hourload_storage::partition_exists(state.buckets.as_ref(), bucket, partition)
        .await
        .map_err(storage_err)?;
    Ok(Json(u8::from(found)))
}

async fn create_and_run_for_partition(
    state: &AppState,
    partition: PartitionKey,
    target: TargetQuery,
    body: NewLoadJob,
) -> Result<(StatusCode, Json<LoadJobResponse>), ApiError> {
    let request = PartitionLoadRequest {
        bucket: body.bucket_name,
        project_id: target
            .project_id
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| state.defaults.project_id.clone()),
        dataset_id: body.dataset_id,
        table_id: body.table_id,
        region: target
            .region
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| state.defaults.region.clone()),
        job_config: body.job_configuration.unwrap_or_default(),
        partition,
    };

    let job = state
        .jobs
        .create_and_start_load_job(request)
        .await
        .map_err(bigquery_err)?;

    Ok((
        StatusCode::CREATED,
        Json(LoadJobResponse::new(&job.job_id, job.status, None)),
    ))
}

/// GET /partition/last_hour/exists/in-bucket
#[utoipa::path(
    get,
    path = "/partition/last_hour/exists/in-bucket",
    tag = "Partitions",
    params(BucketQuery),
    responses(
        (status = 200, description = "1 if any object exists for the previous hour, else 0", body = u8),
        (status = 404, description = "Bucket not found"),
    )
)]
pub async fn check_last_hour_partition_exists(
    State(state): State<Arc<AppState>>,
    Query(q): Query<BucketQuery>,
) -> Result<Json<u8>, ApiError> {
    exists_in_bucket(&state, &q.bucket_name, last_hour_partition()).await
}

/// GET /partition/{partition}/exists/in-bucket
#[utoipa::path(
    get,
    path = "/partition/{partition}/exists/in-bucket",
    tag = "Partitions",
    params(
        ("partition" = String, Path, description = "Partition id, YYYYMMDDHH"),
        BucketQuery,
    ),
    responses(
        (status = 200, description = "1 if any object exists for the partition, else 0", body = u8),
        (status = 400, description = "Malformed partition id"),
        (status = 404, description = "Bucket not found"),
    )
)]
pub async fn check_partition_exists(
    State(state): State<Arc<AppState>>,
    Path(partition): Path<String>,
    Query(q): Query<BucketQuery>,
) -> Result<Json<u8>, ApiError> {
    let partition = parse_partition(&partition)?;
    exists_in_bucket(&state, &q.bucket_name, partition).await
}

/// PUT /partition/last_hour/ingest
#[utoipa::path(
    put,
    path = "/partition/last_hour/ingest",
    tag = "Partitions",
    params(TargetQuery),
    request_body = NewLoadJob,
    responses(
        (status = 201, description = "Load job submitted", body = LoadJobResponse),
        (status = 400, description = "Invalid job configuration"),
    )
)]
pub async fn ingest_last_hour_partition(
    State(state): State<Arc<AppState>>,
    Query(target): Query<TargetQuery>,
    Json(body): Json<NewLoadJob>,
) -> Result<(StatusCode, Json<LoadJobResponse>), ApiError> {
    create_and_run_for_partition(&state, last_hour_partition(), target, body).await
}

/// PUT /partition/{partition}/ingest
#[utoipa::path(
    put,
    path = "/partition/{partition}/ingest",
    tag = "Partitions",
    params(
        ("partition" = String, Path, description = "Partition id, YYYYMMDDHH"),
        TargetQuery,
    ),
    request_body = NewLoadJob,
    responses(
        (status = 201, description = "Load job submitted", body = LoadJobResponse),
        (status = 400, description = "Malformed partition id or invalid job configuration"),
    )
)]
pub async fn ingest_partition(
    State(state): State<Arc<AppState>>,
    Path(partition): Path<String>,
    Query(target): Query<TargetQuery>,
    Json(body): Json<NewLoadJob>,
) -> Result<(StatusCode, Json<LoadJobResponse>), ApiError> {
    let partition = parse_partition(&partition)?;
    create_and_run_for_partition(&state, partition, target, body).await
}
