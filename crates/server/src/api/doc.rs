//! OpenAPI documentation, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "hourload API",
        version = "0.1.0",
        description = "Trigger and poll hourly partition load jobs from Cloud Storage into BigQuery.",
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Partitions", description = "Partition existence checks and ingestion"),
        (name = "Load Jobs", description = "Load job status"),
    ),
    paths(
        crate::api::health::root,
        crate::api::health::health,
        crate::api::partition::check_last_hour_partition_exists,
        crate::api::partition::check_partition_exists,
        crate::api::partition::ingest_last_hour_partition,
        crate::api::partition::ingest_partition,
        crate::api::load_job::load_job_status,
    ),
    components(schemas(
        crate::api::health::HealthResponse,
        crate::api::types::NewLoadJob,
        crate::api::types::LoadJobResponse,
        crate::api::types::JobStatusBody,
    ))
)]
pub struct ApiDoc;
