//! Load-job records and their lifecycle state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::partition::PartitionKey;

// ── JobState ──────────────────────────────────────────────────

/// Lifecycle state of a load job.
///
/// `NotCreated -> Running -> {Success, Failure}`; `NotCreated` is also final
/// when there was nothing to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    NotCreated,
    Running,
    Success,
    Failure,
}

impl JobState {
    /// Stable numeric code exposed over the API.
    pub fn code(self) -> u8 {
        match self {
            JobState::NotCreated => 0,
            JobState::Running => 1,
            JobState::Success => 2,
            JobState::Failure => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            JobState::NotCreated => "NOT_CREATED",
            JobState::Running => "RUNNING",
            JobState::Success => "SUCCESS",
            JobState::Failure => "FAILURE",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Running)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── JobConfig ─────────────────────────────────────────────────

/// Opaque load options (format, encoding, write behaviour) as string pairs.
///
/// Keys follow the snake_case option names (`write_disposition`,
/// `field_delimiter`, ...); the warehouse client decides which it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobConfig(BTreeMap<String, String>);

impl JobConfig {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Replace one hourly partition from headerless, tab-separated CSV.
    /// The destination table must already exist.
    pub fn replace_partition_csv() -> Self {
        Self::empty()
            .with("create_disposition", "CREATE_NEVER")
            .with("write_disposition", "WRITE_TRUNCATE")
            .with("source_format", "CSV")
            .with("field_delimiter", "\t")
            .with("skip_leading_rows", "0")
            .with("quote_character", "")
            .with("encoding", "UTF-8")
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self::replace_partition_csv()
    }
}

impl From<BTreeMap<String, String>> for JobConfig {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

// ── LoadJobMetadata ───────────────────────────────────────────

/// Everything needed to submit (or report on) one load job.
///
/// Never mutated: a lifecycle transition produces a new record via
/// [`LoadJobMetadata::with_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadJobMetadata {
    pub job_id: String,
    pub project_id: String,
    pub dataset_id: String,
    /// Destination table including the `$` partition suffix.
    pub table_id: String,
    pub region: String,
    pub status: JobState,
    /// Source locators (`gs://` globs).
    pub files: Vec<String>,
    pub job_config: JobConfig,
}

impl LoadJobMetadata {
    /// Metadata for loading `partition` of `table_id` from `bucket`, with a
    /// freshly generated job id and status `NOT_CREATED`.
    pub fn for_partition(
        partition: PartitionKey,
        bucket: &str,
        project_id: &str,
        dataset_id: &str,
        table_id: &str,
        region: &str,
        job_config: JobConfig,
    ) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            dataset_id: dataset_id.to_string(),
            table_id: partition.table_with_partition(table_id),
            region: region.to_string(),
            status: JobState::NotCreated,
            files: vec![partition.glob_in_bucket(bucket)],
            job_config,
        }
    }

    pub fn with_status(self, status: JobState) -> Self {
        Self { status, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_codes_and_names() {
        let all = [
            JobState::NotCreated,
            JobState::Running,
            JobState::Success,
            JobState::Failure,
        ];
        let codes: Vec<u8> = all.iter().map(|s| s.code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
        for s in all {
            assert_eq!(serde_json::to_value(s).unwrap(), s.name());
        }
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::NotCreated.is_terminal());
    }

    #[test]
    fn default_config_replaces_partition() {
        let cfg = JobConfig::default();
        assert_eq!(cfg.get("write_disposition"), Some("WRITE_TRUNCATE"));
        assert_eq!(cfg.get("create_disposition"), Some("CREATE_NEVER"));
        assert_eq!(cfg.get("field_delimiter"), Some("\t"));
        assert_eq!(cfg.get("quote_character"), Some(""));
        assert_eq!(cfg.iter().count(), 7);
    }

    #[test]
    fn config_deserializes_from_plain_map() {
        let cfg: JobConfig = serde_json::from_str(r#"{"source_format":"NEWLINE_DELIMITED_JSON"}"#).unwrap();
        assert_eq!(cfg.get("source_format"), Some("NEWLINE_DELIMITED_JSON"));
        assert_eq!(cfg.iter().count(), 1);
    }

    #[test]
    fn metadata_for_partition() {
        let key: PartitionKey = "2023010203".parse().unwrap();
        let meta = LoadJobMetadata::for_partition(key, "b", "p", "d", "t", "us", JobConfig::default());

        assert_eq!(meta.table_id, "t$2023010203");
        assert_eq!(meta.files, vec!["gs://b/year=2023/month=01/day=02/hour=03/*".to_string()]);
        assert_eq!(meta.status, JobState::NotCreated);
        assert!(uuid::Uuid::parse_str(&meta.job_id).is_ok());
    }

    #[test]
    fn job_ids_are_fresh() {
        let key: PartitionKey = "2023010203".parse().unwrap();
        let a = LoadJobMetadata::for_partition(key, "b", "p", "d", "t", "us", JobConfig::empty());
        let b = LoadJobMetadata::for_partition(key, "b", "p", "d", "t", "us", JobConfig::empty());
        assert_ne!(a.job_id, b.job_id);
    }

    #[test]
    fn with_status_replaces_only_status() {
        let key: PartitionKey = "2023010203".parse().unwrap();
        let meta = LoadJobMetadata::for_partition(key, "b", "p", "d", "t", "us", JobConfig::default());
        let running = meta.clone().with_status(JobState::Running);

        assert_eq!(running.status, JobState::Running);
        assert_eq!(running.job_id, meta.job_id);
        assert_eq!(running.files, meta.files);
        assert_eq!(meta.status, JobState::NotCreated);
    }
}
