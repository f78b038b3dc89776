use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use lru::LruCache;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StorageError;

/// Answers whether anything has landed under a prefix of a bucket.
#[async_trait]
pub trait BucketStore: Send + Sync {
    async fn prefix_exists(&self, bucket: &str, prefix: &str) -> Result<bool, StorageError>;
}

/// List at most one object below `prefix`.
async fn first_object_exists(store: &dyn ObjectStore, prefix: &str) -> Result<bool, StorageError> {
    let path = ObjectPath::from(prefix.trim_end_matches('/'));
    let mut stream = store.list(Some(&path));
    match stream.try_next().await {
        Ok(Some(meta)) => {
            debug!(prefix = %prefix, first = %meta.location, "Prefix has objects");
            Ok(true)
        }
        Ok(None) => Ok(false),
        Err(object_store::Error::NotFound { .. }) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

// ── Backend selection ─────────────────────────────────────────

/// Unified bucket backend wrapping object_store.
pub enum StorageBackend {
    Gcs(GcsBucketStore),
    Local(LocalBucketStore),
}

impl StorageBackend {
    pub fn is_remote(&self) -> bool {
        matches!(self, StorageBackend::Gcs(_))
    }
}

#[async_trait]
impl BucketStore for StorageBackend {
    async fn prefix_exists(&self, bucket: &str, prefix: &str) -> Result<bool, StorageError> {
        match self {
            StorageBackend::Gcs(b) => b.prefix_exists(bucket, prefix).await,
            StorageBackend::Local(b) => b.prefix_exists(bucket, prefix).await,
        }
    }
}

// ── GCS ───────────────────────────────────────────────────────

const DEFAULT_CACHED_BUCKETS: usize = 64;

/// Google Cloud Storage backend. Credentials come from the standard
/// `GOOGLE_*` environment variables understood by object_store.
///
/// Bucket names arrive with each request, so the per-bucket clients live in
/// a bounded LRU.
pub struct GcsBucketStore {
    stores: Mutex<LruCache<String, Arc<dyn ObjectStore>>>,
}

impl Default for GcsBucketStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHED_BUCKETS)
    }
}

impl GcsBucketStore {
    pub fn new() -> Self {
        info!("Storage: GCS backend");
        Self::default()
    }

    /// Keep at most `capacity` bucket clients (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            stores: Mutex::new(LruCache::new(capacity)),
        }
    }

    async fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        let mut stores = self.stores.lock().await;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let store: Arc<dyn ObjectStore> = Arc::new(
            GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(bucket)
                .build()?,
        );
        if let Some((evicted, _)) = stores.push(bucket.to_string(), store.clone()) {
            debug!(bucket = %evicted, "Evicted GCS client");
        }
        Ok(store)
    }
}

#[async_trait]
impl BucketStore for GcsBucketStore {
    async fn prefix_exists(&self, bucket: &str, prefix: &str) -> Result<bool, StorageError> {
        let store = self.store_for(bucket).await?;
        first_object_exists(store.as_ref(), prefix).await
    }
}

// ── Local filesystem ──────────────────────────────────────────

/// Local filesystem backend: every bucket is a directory under `root`.
pub struct LocalBucketStore {
    pub root: PathBuf,
}

impl LocalBucketStore {
    pub fn new(root: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(root)?;
        let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        info!("Storage: local backend at {}", root.display());
        Ok(Self { root })
    }
}

#[async_trait]
impl BucketStore for LocalBucketStore {
    async fn prefix_exists(&self, bucket: &str, prefix: &str) -> Result<bool, StorageError> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(StorageError::BucketNotFound(bucket.to_string()));
        }
        let bucket_dir = self.root.join(bucket);
        if !bucket_dir.is_dir() {
            return Err(StorageError::BucketNotFound(bucket.to_string()));
        }
        let store = LocalFileSystem::new_with_prefix(&bucket_dir)?;
        first_object_exists(&store, prefix).await
    }
}
