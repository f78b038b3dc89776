use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    #[error("not configured: {0}")]
    NotConfigured(String),
}
