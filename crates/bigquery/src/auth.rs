//! OAuth access tokens for the BigQuery API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::BigQueryError;

const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, BigQueryError>;
}

/// A fixed bearer token (e.g. `gcloud auth print-access-token`, or an emulator).
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, BigQueryError> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Service-account token from the GCE / Cloud Run metadata server, cached
/// until shortly before it expires.
pub struct MetadataServerToken {
    http: reqwest::Client,
    url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataServerToken {
    /// Honors `GCE_METADATA_HOST` the same way the Google client libraries do.
    pub fn new(http: reqwest::Client) -> Self {
        let host = std::env::var("GCE_METADATA_HOST")
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string());
        Self::with_url(http, format!("http://{}{}", host, TOKEN_PATH))
    }

    pub fn with_url(http: reqwest::Client, url: String) -> Self {
        info!(url = %url, "Using metadata server for BigQuery access tokens");
        Self {
            http,
            url,
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<MetadataTokenResponse, BigQueryError> {
        let resp = self
            .http
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| BigQueryError::Auth(format!("metadata server unreachable: {e}")))?;

        if !resp.status().is_success() {
            return Err(BigQueryError::Auth(format!(
                "metadata server returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| BigQueryError::Auth(format!("bad token response: {e}")))
    }
}

#[async_trait]
impl TokenSource for MetadataServerToken {
    async fn access_token(&self) -> Result<String, BigQueryError> {
        let mut cached = self.cached.lock().await;
        if let Some(c) = cached.as_ref() {
            if Instant::now() < c.refresh_at {
                return Ok(c.token.clone());
            }
        }

        let fresh = self.fetch().await?;
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(EXPIRY_MARGIN);
        debug!(expires_in = fresh.expires_in, "Fetched access token");
        *cached = Some(CachedToken {
            token: fresh.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(fresh.access_token)
    }
}
