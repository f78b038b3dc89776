//! Server startup: shared state initialization and the serve loop.

use std::sync::Arc;

use tracing::info;

use hourload_bigquery::{BigQueryClient, LoadJobService};
use hourload_core::Config;
use hourload_storage::StorageBackend;

use crate::router;
use crate::state::AppState;

/// Build `AppState` from config: the BigQuery client and the bucket backend.
pub fn build_app_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let client = BigQueryClient::new(&config.bigquery)?;

    let storage = StorageBackend::from_config(&config.storage)?;
    info!(
        "Storage backend ready ({})",
        if storage.is_remote() { "gcs" } else { "local" }
    );

    Ok(Arc::new(AppState {
        jobs: LoadJobService::new(Arc::new(client)),
        buckets: Arc::new(storage),
        defaults: config.gcp.clone(),
    }))
}

pub async fn serve(config: &Config) -> anyhow::Result<()> {
    config.log_summary();

    let state = build_app_state(config)?;
    let app = router::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    info!("API docs at http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
