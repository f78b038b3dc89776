use std::sync::Arc;

use hourload_bigquery::LoadJobService;
use hourload_core::config::GcpConfig;
use hourload_storage::BucketStore;

/// Long-lived handles shared by every request. Nothing in here is mutated
/// after startup.
pub struct AppState {
    pub jobs: LoadJobService,
    pub buckets: Arc<dyn BucketStore>,
    /// Project and region used when a request doesn't name them.
    pub defaults: GcpConfig,
}
