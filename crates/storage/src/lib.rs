//! Object-storage checks for hourly partitions.

pub mod backend;
pub mod error;

use tracing::info;

pub use backend::{BucketStore, GcsBucketStore, LocalBucketStore, StorageBackend};
pub use error::StorageError;

use hourload_core::config::StorageConfig;

impl StorageBackend {
    /// Select the backend named by `STORAGE_BACKEND`.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        match config.backend.as_str() {
            "gcs" => Ok(StorageBackend::Gcs(GcsBucketStore::new())),
            "local" => Ok(StorageBackend::Local(LocalBucketStore::new(&config.local_root)?)),
            other => Err(StorageError::NotConfigured(format!(
                "unknown storage backend '{}' (expected 'gcs' or 'local')",
                other
            ))),
        }
    }
}

/// Whether `bucket` holds any object for the partition's storage prefix.
pub async fn partition_exists(
    store: &dyn BucketStore,
    bucket: &str,
    partition: hourload_core::PartitionKey,
) -> Result<bool, StorageError> {
    let prefix = partition.storage_prefix();
    let exists = store.prefix_exists(bucket, &prefix).await?;
    info!(bucket = %bucket, prefix = %prefix, exists, "Checked partition in bucket");
    Ok(exists)
}
