//! Request and response bodies.

use std::collections::HashMap;

use hourload_core::{JobConfig, JobState};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BucketQuery {
    /// Bucket to look in.
    pub bucket_name: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TargetQuery {
    /// Project owning the job (defaults to `GCP_PROJECT`).
    pub project_id: Option<String>,
    /// Job location (defaults to `GCP_REGION`).
    pub region: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewLoadJob {
    pub bucket_name: String,
    pub dataset_id: String,
    pub table_id: String,
    /// Load options; omitted or null replaces the partition from headerless TSV.
    #[serde(default)]
    #[schema(value_type = Option<HashMap<String, String>>)]
    pub job_configuration: Option<JobConfig>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobStatusBody {
    pub name: String,
    pub code: u8,
    pub error_msg: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoadJobResponse {
    pub job_id: String,
    pub status: JobStatusBody,
}

impl LoadJobResponse {
    pub fn new(job_id: &str, state: JobState, error_msg: Option<String>) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatusBody {
                name: state.name().to_string(),
                code: state.code(),
                error_msg,
            },
        }
    }
}
