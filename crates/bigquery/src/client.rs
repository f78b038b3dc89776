//! BigQuery v2 REST client.
//!
//! Implements [`Warehouse`] with two calls: `jobs.insert` for load jobs and
//! `jobs.get` for point-in-time status. No polling, retries or backoff live
//! here; each call is a single request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hourload_core::config::BigQueryConfig;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{MetadataServerToken, StaticToken, TokenSource};
use crate::error::BigQueryError;
use crate::load_options::LoadOptions;
use crate::warehouse::{
    JobErrorResult, JobReference, JobSnapshot, LoadJobRequest, RemoteJobState, TableReference,
    Warehouse,
};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireJobReference {
    project_id: String,
    job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTableReference<'a> {
    project_id: &'a str,
    dataset_id: &'a str,
    table_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireLoad<'a> {
    source_uris: &'a [String],
    destination_table: WireTableReference<'a>,
    #[serde(flatten)]
    options: &'a LoadOptions,
}

#[derive(Serialize)]
struct WireConfiguration<'a> {
    load: WireLoad<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertJobBody<'a> {
    job_reference: WireJobReference,
    configuration: WireConfiguration<'a>,
}

impl<'a> InsertJobBody<'a> {
    fn new(request: &'a LoadJobRequest) -> Self {
        let TableReference {
            project_id,
            dataset_id,
            table_id,
        } = &request.destination;
        Self {
            job_reference: WireJobReference {
                project_id: request.reference.project_id.clone(),
                job_id: request.reference.job_id.clone(),
                location: Some(request.reference.location.clone()),
            },
            configuration: WireConfiguration {
                load: WireLoad {
                    source_uris: &request.source_uris,
                    destination_table: WireTableReference {
                        project_id,
                        dataset_id,
                        table_id,
                    },
                    options: &request.options,
                },
            },
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WireStatus {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error_result: Option<JobErrorResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireJob {
    #[serde(default)]
    job_reference: Option<WireJobReference>,
    #[serde(default)]
    status: WireStatus,
}

impl WireJob {
    fn into_snapshot(self, requested: &JobReference) -> JobSnapshot {
        let reference = match self.job_reference {
            Some(r) => JobReference {
                location: r.location.unwrap_or_else(|| requested.location.clone()),
                project_id: r.project_id,
                job_id: r.job_id,
            },
            None => requested.clone(),
        };
        JobSnapshot {
            reference,
            state: RemoteJobState::parse(self.status.state.as_deref().unwrap_or("")),
            error_result: self.status.error_result,
        }
    }
}

#[derive(Deserialize)]
struct WireErrorBody {
    error: WireError,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    message: String,
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

const MAX_JOB_ID_LEN: usize = 1024;

/// Letters, digits, `_` and `-`, at most 1024 characters.
fn is_valid_job_id(job_id: &str) -> bool {
    !job_id.is_empty()
        && job_id.len() <= MAX_JOB_ID_LEN
        && job_id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Project ids, including domain-scoped ones (`example.com:proj`).
fn is_valid_project_id(project_id: &str) -> bool {
    !project_id.is_empty()
        && project_id != "."
        && project_id != ".."
        && project_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`Warehouse`] backed by the BigQuery REST API.
pub struct BigQueryClient {
    http: reqwest::Client,
    api_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl BigQueryClient {
    /// Build a client from config. Uses the static token when one is set,
    /// the metadata server otherwise.
    pub fn new(config: &BigQueryConfig) -> Result<Self, BigQueryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|e| BigQueryError::Transport(e.to_string()))?;

        let tokens: Arc<dyn TokenSource> = match &config.access_token {
            Some(token) => Arc::new(StaticToken::new(token.clone())),
            None => Arc::new(MetadataServerToken::new(http.clone())),
        };

        info!(api_url = %config.api_url, "BigQueryClient initialised");
        Ok(Self::with_token_source(http, &config.api_url, tokens))
    }

    pub fn with_token_source(
        http: reqwest::Client,
        api_url: &str,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// `{api}/projects/{project}/jobs[/{job}]`, each id a single encoded
    /// path segment.
    fn jobs_url(&self, project_id: &str, job_id: Option<&str>) -> Result<Url, BigQueryError> {
        if !is_valid_project_id(project_id) {
            return Err(BigQueryError::InvalidReference(format!(
                "invalid project id '{}'",
                project_id
            )));
        }
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| BigQueryError::Transport(format!("bad API url '{}': {}", self.api_url, e)))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                BigQueryError::Transport(format!("API url '{}' cannot take a path", self.api_url))
            })?;
            segments.pop_if_empty().push("projects").push(project_id).push("jobs");
            if let Some(job_id) = job_id {
                segments.push(job_id);
            }
        }
        Ok(url)
    }

    /// Turn a non-success response into [`BigQueryError::Api`], preferring the
    /// message from the JSON error envelope.
    async fn api_error(resp: reqwest::Response) -> BigQueryError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<WireErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);
        warn!(status, message = %message, "BigQuery API error");
        BigQueryError::Api { status, message }
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    async fn insert_load_job(&self, request: &LoadJobRequest) -> Result<JobSnapshot, BigQueryError> {
        let url = self.jobs_url(&request.reference.project_id, None)?;
        let token = self.tokens.access_token().await?;
        let body = InsertJobBody::new(request);

        let resp = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BigQueryError::Transport(e.to_string()))?;

        match resp.status() {
            StatusCode::CONFLICT => Err(BigQueryError::AlreadyExists {
                job_id: request.reference.job_id.clone(),
            }),
            s if s.is_success() => {
                let job: WireJob = resp
                    .json()
                    .await
                    .map_err(|e| BigQueryError::ParseError(e.to_string()))?;
                let snapshot = job.into_snapshot(&request.reference);
                debug!(job_id = %snapshot.reference.job_id, state = %snapshot.state, "Inserted load job");
                Ok(snapshot)
            }
            _ => Err(Self::api_error(resp).await),
        }
    }

    async fn get_job(&self, reference: &JobReference) -> Result<Option<JobSnapshot>, BigQueryError> {
        // No job can exist under an id BigQuery would never have issued.
        if !is_valid_job_id(&reference.job_id) {
            debug!(job_id = %reference.job_id, "Not a BigQuery job id");
            return Ok(None);
        }
        let url = self.jobs_url(&reference.project_id, Some(&reference.job_id))?;
        let token = self.tokens.access_token().await?;

        let resp = self
            .http
            .get(url)
            .query(&[("location", reference.location.as_str())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BigQueryError::Transport(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let job: WireJob = resp
                    .json()
                    .await
                    .map_err(|e| BigQueryError::ParseError(e.to_string()))?;
                Ok(Some(job.into_snapshot(reference)))
            }
            _ => Err(Self::api_error(resp).await),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests against a local stand-in for the REST API
// ---------------------------------------------------------------------------
