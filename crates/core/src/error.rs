use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HourloadError {
    #[error("Malformed partition '{input}': {reason}")]
    MalformedPartition { input: String, reason: String },

    #[error("Invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HourloadError>;
