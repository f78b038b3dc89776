//! The warehouse seam: what the lifecycle controller needs from BigQuery.
//!
//! Jobs are plain values returned by explicit calls; nothing here reloads
//! remote state behind the caller's back.

use std::fmt;

use async_trait::async_trait;
use hourload_core::LoadJobMetadata;
use serde::{Deserialize, Serialize};

use crate::error::BigQueryError;
use crate::load_options::LoadOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
    pub location: String,
}

impl JobReference {
    pub fn new(project_id: &str, job_id: &str, location: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            job_id: job_id.to_string(),
            location: location.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

/// A fully validated load-job submission.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadJobRequest {
    pub reference: JobReference,
    pub destination: TableReference,
    pub source_uris: Vec<String>,
    pub options: LoadOptions,
}

impl LoadJobRequest {
    /// Fails with `InvalidJobConfig` when the metadata's config has options
    /// BigQuery doesn't accept.
    pub fn from_metadata(metadata: &LoadJobMetadata) -> Result<Self, BigQueryError> {
        Ok(Self {
            reference: JobReference::new(&metadata.project_id, &metadata.job_id, &metadata.region),
            destination: TableReference {
                project_id: metadata.project_id.clone(),
                dataset_id: metadata.dataset_id.clone(),
                table_id: metadata.table_id.clone(),
            },
            source_uris: metadata.files.clone(),
            options: LoadOptions::try_from(&metadata.job_config)?,
        })
    }
}

/// Job state as BigQuery reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteJobState {
    Pending,
    Running,
    Done,
    Other(String),
}

impl RemoteJobState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PENDING" => RemoteJobState::Pending,
            "RUNNING" => RemoteJobState::Running,
            "DONE" => RemoteJobState::Done,
            other => RemoteJobState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RemoteJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteJobState::Pending => f.write_str("PENDING"),
            RemoteJobState::Running => f.write_str("RUNNING"),
            RemoteJobState::Done => f.write_str("DONE"),
            RemoteJobState::Other(s) => f.write_str(s),
        }
    }
}

/// The `status.errorResult` of a finished job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobErrorResult {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl fmt::Display for JobErrorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = self.reason.as_deref().unwrap_or("error");
        let message = self.message.as_deref().unwrap_or("no message");
        write!(f, "{}: {}", reason, message)?;
        if let Some(location) = &self.location {
            write!(f, " (location: {})", location)?;
        }
        Ok(())
    }
}

/// Point-in-time view of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub reference: JobReference,
    pub state: RemoteJobState,
    pub error_result: Option<JobErrorResult>,
}

impl JobSnapshot {
    /// Accepted but not finished. `PENDING` counts.
    pub fn is_running(&self) -> bool {
        matches!(self.state, RemoteJobState::Pending | RemoteJobState::Running)
    }

    pub fn is_done(&self) -> bool {
        self.state == RemoteJobState::Done
    }
}

/// BigQuery job operations used by [`crate::LoadJobService`].
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Submit a load job. Fails with `AlreadyExists` when the id is taken.
    async fn insert_load_job(&self, request: &LoadJobRequest) -> Result<JobSnapshot, BigQueryError>;

    /// Look a job up. `Ok(None)` means BigQuery doesn't know it.
    async fn get_job(&self, reference: &JobReference) -> Result<Option<JobSnapshot>, BigQueryError>;
}
