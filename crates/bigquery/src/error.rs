/// Errors that can occur talking to BigQuery or classifying its jobs.
#[derive(Debug, thiserror::Error)]
pub enum BigQueryError {
    /// The warehouse has no job with this id (never existed or expired).
    #[error("Job {job_id} not found")]
    JobNotFound { job_id: String },

    /// A job with this id was already submitted.
    #[error("Job {job_id} already exists")]
    AlreadyExists { job_id: String },

    /// The warehouse reported a job state this service doesn't know.
    #[error("Unable to poll job {job_id}: unrecognised state '{state}'")]
    UnrecognizedState { job_id: String, state: String },

    /// The load configuration has an unknown key or an unparsable value.
    #[error("Invalid job configuration: {0}")]
    InvalidJobConfig(String),

    /// A project or job id that can't name a BigQuery resource.
    #[error("Invalid job reference: {0}")]
    InvalidReference(String),

    /// The BigQuery API answered with a non-success status.
    #[error("BigQuery API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request never got an answer (connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// No access token could be obtained.
    #[error("Auth error: {0}")]
    Auth(String),

    /// The API answered with a body we couldn't decode.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl BigQueryError {
    /// True when the request never reached BigQuery.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, BigQueryError::Transport(_) | BigQueryError::Auth(_))
    }
}
