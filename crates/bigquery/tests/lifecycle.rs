//! Lifecycle and polling behaviour against a scripted warehouse.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hourload_bigquery::*;
use hourload_core::{JobConfig, JobState, LoadJobMetadata, PartitionKey};

// ── Scripted warehouse ────────────────────────────────────────────

enum Insert {
    Accept(RemoteJobState),
    Fail(fn() -> BigQueryError),
}

enum Lookup {
    Found(RemoteJobState, Option<&'static str>),
    Missing,
    Fail(fn() -> BigQueryError),
}

struct ScriptedWarehouse {
    insert: Insert,
    lookup: Lookup,
    inserted: Mutex<Vec<LoadJobRequest>>,
    lookups: Mutex<Vec<JobReference>>,
}

impl ScriptedWarehouse {
    fn new(insert: Insert, lookup: Lookup) -> Arc<Self> {
        Arc::new(Self {
            insert,
            lookup,
            inserted: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
        })
    }

    fn insert_calls(&self) -> usize {
        self.inserted.lock().unwrap().len()
    }
}

#[async_trait]
impl Warehouse for ScriptedWarehouse {
    async fn insert_load_job(&self, request: &LoadJobRequest) -> Result<JobSnapshot, BigQueryError> {
        self.inserted.lock().unwrap().push(request.clone());
        match &self.insert {
            Insert::Accept(state) => Ok(JobSnapshot {
                reference: request.reference.clone(),
                state: state.clone(),
                error_result: None,
            }),
            Insert::Fail(make) => Err(make()),
        }
    }

    async fn get_job(&self, reference: &JobReference) -> Result<Option<JobSnapshot>, BigQueryError> {
        self.lookups.lock().unwrap().push(reference.clone());
        match &self.lookup {
            Lookup::Found(state, error) => Ok(Some(JobSnapshot {
                reference: reference.clone(),
                state: state.clone(),
                error_result: error.map(|m| JobErrorResult {
                    reason: Some("invalid".into()),
                    location: None,
                    message: Some(m.into()),
                }),
            })),
            Lookup::Missing => Ok(None),
            Lookup::Fail(make) => Err(make()),
        }
    }
}

fn conflict() -> BigQueryError {
    BigQueryError::AlreadyExists { job_id: "j".into() }
}

fn refused() -> BigQueryError {
    BigQueryError::Transport("connection refused".into())
}

fn bad_reference() -> BigQueryError {
    BigQueryError::InvalidReference("invalid project id '..'".into())
}

fn server_error() -> BigQueryError {
    BigQueryError::Api { status: 503, message: "backend error".into() }
}

fn partition_request() -> PartitionLoadRequest {
    PartitionLoadRequest {
        bucket: "b".into(),
        project_id: "p".into(),
        dataset_id: "d".into(),
        table_id: "t".into(),
        region: "us".into(),
        job_config: JobConfig::default(),
        partition: "2023010203".parse::<PartitionKey>().unwrap(),
    }
}

fn metadata() -> LoadJobMetadata {
    LoadJobMetadata::for_partition(
        "2023010203".parse().unwrap(),
        "b",
        "p",
        "d",
        "t",
        "us",
        JobConfig::default(),
    )
}

// ── create_and_start_load_job ─────────────────────────────────────

#[tokio::test]
async fn ingest_partition_end_to_end() {
    let wh = ScriptedWarehouse::new(Insert::Accept(RemoteJobState::Running), Lookup::Missing);
    let service = LoadJobService::new(wh.clone());

    let job = service
        .create_and_start_load_job(partition_request())
        .await
        .unwrap();

    assert_eq!(job.status, JobState::Running);
    assert_eq!(job.table_id, "t$2023010203");
    assert_eq!(job.files, vec!["gs://b/year=2023/month=01/day=02/hour=03/*".to_string()]);

    let inserted = wh.inserted.lock().unwrap();
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].reference.job_id, job.job_id);
    assert_eq!(inserted[0].destination.table_id, "t$2023010203");
    assert_eq!(inserted[0].destination.dataset_id, "d");
    assert_eq!(inserted[0].reference.location, "us");
}

#[tokio::test]
async fn invalid_job_config_fails_before_submission() {
    let wh = ScriptedWarehouse::new(Insert::Accept(RemoteJobState::Running), Lookup::Missing);
    let service = LoadJobService::new(wh.clone());

    let mut req = partition_request();
    req.job_config = JobConfig::default().with("not_an_option", "x");

    let err = service.create_and_start_load_job(req).await.unwrap_err();
    assert!(matches!(err, BigQueryError::InvalidJobConfig(_)));
    assert_eq!(wh.insert_calls(), 0);
}

// ── start_load_job ────────────────────────────────────────────────

#[tokio::test]
async fn empty_file_list_is_not_created_without_submission() {
    let wh = ScriptedWarehouse::new(Insert::Accept(RemoteJobState::Running), Lookup::Missing);
    let service = LoadJobService::new(wh.clone());

    let mut meta = metadata();
    meta.files.clear();

    assert_eq!(service.start_load_job(&meta).await.unwrap(), JobState::NotCreated);
    assert_eq!(wh.insert_calls(), 0);
    assert!(wh.lookups.lock().unwrap().is_empty());
}

#[tokio::test]
async fn accepted_pending_job_is_running() {
    let wh = ScriptedWarehouse::new(Insert::Accept(RemoteJobState::Pending), Lookup::Missing);
    let service = LoadJobService::new(wh);

    assert_eq!(service.start_load_job(&metadata()).await.unwrap(), JobState::Running);
}

#[tokio::test]
async fn already_running_job_is_running() {
    let wh = ScriptedWarehouse::new(
        Insert::Fail(conflict),
        Lookup::Found(RemoteJobState::Running, None),
    );
    let service = LoadJobService::new(wh.clone());

    assert_eq!(service.start_load_job(&metadata()).await.unwrap(), JobState::Running);
    assert_eq!(wh.lookups.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn submission_fault_with_recorded_error_is_failure() {
    let wh = ScriptedWarehouse::new(
        Insert::Fail(server_error),
        Lookup::Found(RemoteJobState::Done, Some("bad row")),
    );
    let service = LoadJobService::new(wh);

    assert_eq!(service.start_load_job(&metadata()).await.unwrap(), JobState::Failure);
}

#[tokio::test]
async fn submission_fault_on_finished_job_is_success() {
    let wh = ScriptedWarehouse::new(Insert::Fail(conflict), Lookup::Found(RemoteJobState::Done, None));
    let service = LoadJobService::new(wh);

    assert_eq!(service.start_load_job(&metadata()).await.unwrap(), JobState::Success);
}

#[tokio::test]
async fn submission_fault_without_job_is_failure() {
    let wh = ScriptedWarehouse::new(Insert::Fail(server_error), Lookup::Missing);
    let service = LoadJobService::new(wh);

    assert_eq!(service.start_load_job(&metadata()).await.unwrap(), JobState::Failure);
}

#[tokio::test]
async fn submission_fault_with_unknown_state_is_failure() {
    let wh = ScriptedWarehouse::new(
        Insert::Fail(server_error),
        Lookup::Found(RemoteJobState::Other("WEIRD".into()), None),
    );
    let service = LoadJobService::new(wh);

    assert_eq!(service.start_load_job(&metadata()).await.unwrap(), JobState::Failure);
}

#[tokio::test]
async fn submission_fault_with_failed_lookup_is_failure() {
    let wh = ScriptedWarehouse::new(Insert::Fail(server_error), Lookup::Fail(refused));
    let service = LoadJobService::new(wh);

    assert_eq!(service.start_load_job(&metadata()).await.unwrap(), JobState::Failure);
}

#[tokio::test]
async fn unreachable_warehouse_propagates() {
    let wh = ScriptedWarehouse::new(Insert::Fail(refused), Lookup::Fail(refused));
    let service = LoadJobService::new(wh);

    let err = service.start_load_job(&metadata()).await.unwrap_err();
    assert!(matches!(err, BigQueryError::Transport(_)));
}

#[tokio::test]
async fn invalid_reference_propagates_without_lookup() {
    let wh = ScriptedWarehouse::new(Insert::Fail(bad_reference), Lookup::Fail(bad_reference));
    let service = LoadJobService::new(wh.clone());

    let err = service.start_load_job(&metadata()).await.unwrap_err();
    assert!(matches!(err, BigQueryError::InvalidReference(_)));
    assert!(wh.lookups.lock().unwrap().is_empty());
}

// ── poll_load_job_status ──────────────────────────────────────────

#[tokio::test]
async fn poll_unknown_job_is_not_found() {
    let wh = ScriptedWarehouse::new(Insert::Fail(conflict), Lookup::Missing);
    let service = LoadJobService::new(wh);

    let err = service.poll_load_job_status("ghost", "p", "us").await.unwrap_err();
    assert!(matches!(err, BigQueryError::JobNotFound { ref job_id } if job_id == "ghost"));
}

#[tokio::test]
async fn poll_running_job() {
    let wh = ScriptedWarehouse::new(Insert::Fail(conflict), Lookup::Found(RemoteJobState::Pending, None));
    let service = LoadJobService::new(wh.clone());

    let report = service.poll_load_job_status("j", "p", "EU").await.unwrap();
    assert_eq!(report, JobStatusReport { state: JobState::Running, error_msg: None });

    let lookups = wh.lookups.lock().unwrap();
    assert_eq!(lookups[0], JobReference::new("p", "j", "EU"));
    assert_eq!(wh.insert_calls(), 0);
}

#[tokio::test]
async fn poll_failed_job_carries_message() {
    let wh = ScriptedWarehouse::new(
        Insert::Fail(conflict),
        Lookup::Found(RemoteJobState::Done, Some("Too many errors")),
    );
    let service = LoadJobService::new(wh);

    let report = service.poll_load_job_status("j", "p", "us").await.unwrap();
    assert_eq!(report.state, JobState::Failure);
    let msg = report.error_msg.unwrap();
    assert!(!msg.is_empty());
    assert!(msg.contains("Too many errors"));
}

#[tokio::test]
async fn poll_succeeded_job() {
    let wh = ScriptedWarehouse::new(Insert::Fail(conflict), Lookup::Found(RemoteJobState::Done, None));
    let service = LoadJobService::new(wh);

    let report = service.poll_load_job_status("j", "p", "us").await.unwrap();
    assert_eq!(report, JobStatusReport { state: JobState::Success, error_msg: None });
}

#[tokio::test]
async fn poll_unrecognised_state_is_an_error() {
    let wh = ScriptedWarehouse::new(
        Insert::Fail(conflict),
        Lookup::Found(RemoteJobState::Other("SUSPENDED".into()), None),
    );
    let service = LoadJobService::new(wh);

    let err = service.poll_load_job_status("j", "p", "us").await.unwrap_err();
    assert!(matches!(err, BigQueryError::UnrecognizedState { ref state, .. } if state == "SUSPENDED"));
}

#[tokio::test]
async fn poll_with_invalid_reference_is_an_error() {
    let wh = ScriptedWarehouse::new(Insert::Fail(conflict), Lookup::Fail(bad_reference));
    let service = LoadJobService::new(wh);

    let err = service.poll_load_job_status("j", "..", "us").await.unwrap_err();
    assert!(matches!(err, BigQueryError::InvalidReference(_)));
}

#[tokio::test]
async fn poll_propagates_lookup_errors() {
    let wh = ScriptedWarehouse::new(Insert::Fail(conflict), Lookup::Fail(server_error));
    let service = LoadJobService::new(wh);

    let err = service.poll_load_job_status("j", "p", "us").await.unwrap_err();
    assert!(matches!(err, BigQueryError::Api { status: 503, .. }));
}
