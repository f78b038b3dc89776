pub mod auth;
pub mod client;
pub mod error;
pub mod lifecycle;
pub mod load_options;
pub mod warehouse;

pub use auth::{MetadataServerToken, StaticToken, TokenSource};
pub use client::BigQueryClient;
pub use error::BigQueryError;
pub use lifecycle::{JobStatusReport, LoadJobService, PartitionLoadRequest};
pub use load_options::LoadOptions;
pub use warehouse::{
    JobErrorResult, JobReference, JobSnapshot, LoadJobRequest, RemoteJobState, TableReference,
    Warehouse,
};
