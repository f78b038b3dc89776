//! HTTP handlers, grouped by resource.
//!
//! Shared error mapping lives here; each handler returns
//! `Result<_, ApiError>` and converts domain errors with the helpers below.

pub mod doc;
mod health;
mod load_job;
mod partition;
pub mod types;

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use hourload_bigquery::BigQueryError;
use hourload_core::{HourloadError, PartitionKey};
use hourload_storage::StorageError;

pub type ApiError = (StatusCode, Json<Value>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

/// Parse a partition id from the path, or answer 400.
pub(crate) fn parse_partition(raw: &str) -> Result<PartitionKey, ApiError> {
    raw.parse().map_err(|e: HourloadError| error_response(StatusCode::BAD_REQUEST, e.to_string()))
}

/// Map a BigQuery error to an HTTP response.
pub(crate) fn bigquery_err(e: BigQueryError) -> ApiError {
    let status = match &e {
        BigQueryError::JobNotFound { .. } => {
            return error_response(StatusCode::NOT_FOUND, "Job not found.");
        }
        BigQueryError::InvalidJobConfig(_) | BigQueryError::InvalidReference(_) => {
            StatusCode::BAD_REQUEST
        }
        BigQueryError::AlreadyExists { .. } => StatusCode::CONFLICT,
        BigQueryError::UnrecognizedState { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        BigQueryError::Api { .. }
        | BigQueryError::Transport(_)
        | BigQueryError::Auth(_)
        | BigQueryError::ParseError(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        error!(error = %e, "BigQuery request failed");
    }
    error_response(status, e.to_string())
}

/// Map a storage error to an HTTP response.
pub(crate) fn storage_err(e: StorageError) -> ApiError {
    let status = match &e {
        StorageError::BucketNotFound(_) => StatusCode::NOT_FOUND,
        StorageError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        StorageError::ObjectStore(_) | StorageError::Io(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        error!(error = %e, "Storage request failed");
    }
    error_response(status, e.to_string())
}

// ── Re-exports ───────────────────────────────────────────────────
// Flat `api::foo` paths for route registration.

pub use health::{health, root};
pub use load_job::load_job_status;
pub use partition::{
    check_last_hour_partition_exists, check_partition_exists, ingest_last_hour_partition,
    ingest_partition,
};
