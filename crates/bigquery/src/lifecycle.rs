//! Load-job lifecycle: create → start → poll.
//!
//! Every warehouse-side outcome is folded into a [`JobState`]. The only
//! errors that escape are the ones with no job state to report: invalid load
//! options or job references, a BigQuery that can't be reached at all, an unknown job id on
//! poll, and a state this service doesn't recognise.

use std::sync::Arc;

use hourload_core::{JobConfig, JobState, LoadJobMetadata, PartitionKey};
use tracing::{debug, error, info};

use crate::error::BigQueryError;
use crate::warehouse::{JobReference, JobSnapshot, LoadJobRequest, Warehouse};

/// Inputs for loading one hourly partition.
#[derive(Debug, Clone)]
pub struct PartitionLoadRequest {
    pub bucket: String,
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
    pub region: String,
    pub job_config: JobConfig,
    pub partition: PartitionKey,
}

/// Result of a single status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusReport {
    pub state: JobState,
    /// Rendered error result; only set for `FAILURE`.
    pub error_msg: Option<String>,
}

/// Starts and polls load jobs against an injected [`Warehouse`].
#[derive(Clone)]
pub struct LoadJobService {
    warehouse: Arc<dyn Warehouse>,
}

impl LoadJobService {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }

    /// Build the metadata for `request.partition` and submit it.
    ///
    /// Returns the metadata carrying the state the submission ended in.
    pub async fn create_and_start_load_job(
        &self,
        request: PartitionLoadRequest,
    ) -> Result<LoadJobMetadata, BigQueryError> {
        let metadata = LoadJobMetadata::for_partition(
            request.partition,
            &request.bucket,
            &request.project_id,
            &request.dataset_id,
            &request.table_id,
            &request.region,
            request.job_config,
        );
        info!(
            job_id = %metadata.job_id,
            partition = %request.partition,
            table = %metadata.table_id,
            "Creating load job for partition"
        );

        let state = self.start_load_job(&metadata).await?;
        info!(
            job_id = %metadata.job_id,
            state = %state,
            terminal = state.is_terminal(),
            "Load job submission finished"
        );
        Ok(metadata.with_status(state))
    }

    /// Submit a load job and classify the outcome.
    ///
    /// With no source files nothing is submitted and the job stays
    /// `NOT_CREATED`.
    pub async fn start_load_job(&self, metadata: &LoadJobMetadata) -> Result<JobState, BigQueryError> {
        if metadata.files.is_empty() {
            info!(job_id = %metadata.job_id, "No files in job. Skipping job");
            return Ok(JobState::NotCreated);
        }

        let request = LoadJobRequest::from_metadata(metadata)?;

        match self.warehouse.insert_load_job(&request).await {
            Ok(snapshot) => {
                info!(job_id = %metadata.job_id, state = %snapshot.state, "Started job");
                debug!(job = ?snapshot, "Job information");
                Ok(classify_accepted(&snapshot))
            }
            Err(err @ BigQueryError::InvalidReference(_)) => {
                error!(job_id = %metadata.job_id, error = %err, "Job not submitted");
                Err(err)
            }
            Err(submit_err) => self.recover_submission(&request.reference, submit_err).await,
        }
    }

    /// The insert call failed; look the job up to see whether it exists
    /// anyway (e.g. a retried request whose first attempt got through).
    async fn recover_submission(
        &self,
        reference: &JobReference,
        submit_err: BigQueryError,
    ) -> Result<JobState, BigQueryError> {
        let job_id = &reference.job_id;

        let snapshot = match self.warehouse.get_job(reference).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                error!(job_id = %job_id, error = %submit_err, "Failed to begin job");
                return Ok(JobState::Failure);
            }
            Err(lookup_err) if submit_err.is_unreachable() && lookup_err.is_unreachable() => {
                error!(job_id = %job_id, error = %submit_err, "BigQuery unreachable");
                return Err(submit_err);
            }
            Err(lookup_err) => {
                error!(
                    job_id = %job_id,
                    error = %submit_err,
                    lookup_error = %lookup_err,
                    "Failed to begin job"
                );
                return Ok(JobState::Failure);
            }
        };

        if snapshot.is_running() {
            info!(job_id = %job_id, state = %snapshot.state, "Tried starting a job that already begun");
            return Ok(JobState::Running);
        }
        if let Some(err) = &snapshot.error_result {
            error!(job_id = %job_id, error = %err, "Job failed");
            return Ok(JobState::Failure);
        }
        if snapshot.is_done() {
            info!(job_id = %job_id, "Tried to start job, but it's already done successfully");
            return Ok(JobState::Success);
        }

        error!(job_id = %job_id, error = %submit_err, state = %snapshot.state, "Failed to begin job");
        Ok(JobState::Failure)
    }

    /// Single point-in-time status check of an existing job. No waiting.
    pub async fn poll_load_job_status(
        &self,
        job_id: &str,
        project_id: &str,
        region: &str,
    ) -> Result<JobStatusReport, BigQueryError> {
        let reference = JobReference::new(project_id, job_id, region);

        let Some(snapshot) = self.warehouse.get_job(&reference).await? else {
            error!(job_id = %job_id, "Polling job. Result: Job does not exist");
            return Err(BigQueryError::JobNotFound {
                job_id: job_id.to_string(),
            });
        };

        if snapshot.is_running() {
            info!(job_id = %job_id, "Polling job. Result: Job is running");
            return Ok(JobStatusReport {
                state: JobState::Running,
                error_msg: None,
            });
        }
        if let Some(err) = &snapshot.error_result {
            error!(job_id = %job_id, error = %err, "Polling job. Result: Job failed");
            return Ok(JobStatusReport {
                state: JobState::Failure,
                error_msg: Some(err.to_string()),
            });
        }
        if snapshot.is_done() {
            info!(job_id = %job_id, "Polling job. Result: Job succeeded");
            return Ok(JobStatusReport {
                state: JobState::Success,
                error_msg: None,
            });
        }

        Err(BigQueryError::UnrecognizedState {
            job_id: job_id.to_string(),
            state: snapshot.state.to_string(),
        })
    }
}

/// Classify the snapshot returned by a successful insert. An accepted job
/// that reports neither an error nor completion is treated as running.
fn classify_accepted(snapshot: &JobSnapshot) -> JobState {
    if snapshot.is_running() {
        JobState::Running
    } else if snapshot.error_result.is_some() {
        JobState::Failure
    } else if snapshot.is_done() {
        JobState::Success
    } else {
        JobState::Running
    }
}
