pub mod config;
pub mod error;
pub mod job;
pub mod partition;

pub use config::Config;
pub use error::*;
pub use job::{JobConfig, JobState, LoadJobMetadata};
pub use partition::PartitionKey;
