use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{HourloadError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub const DEFAULT_BIGQUERY_API_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub log: LogConfig,
    pub gcp: GcpConfig,
    pub bigquery: BigQueryConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `HOURLOAD_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("HOURLOAD_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            log: LogConfig::from_env_profiled(p),
            gcp: GcpConfig::from_env_profiled(p),
            bigquery: BigQueryConfig::from_env_profiled(p),
            storage: StorageConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:    {}:{}", self.server.host, self.server.port);
        tracing::info!("  log:       level={}", self.log.level);
        tracing::info!("  gcp:       project={}, region={}", self.gcp.project_id, self.gcp.region);
        tracing::info!(
            "  bigquery:  api={}, token={}",
            self.bigquery.api_url,
            if self.bigquery.access_token.is_some() { "static" } else { "metadata-server" }
        );
        tracing::info!(
            "  storage:   backend={}, local_root={}",
            self.storage.backend,
            self.storage.local_root.display()
        );
    }

    /// Return a redacted view safe for printing (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "log": { "level": self.log.level },
            "gcp": { "project_id": self.gcp.project_id, "region": self.gcp.region },
            "bigquery": {
                "api_url": self.bigquery.api_url,
                "static_token": self.bigquery.access_token.is_some(),
                "http_timeout_seconds": self.bigquery.http_timeout_seconds,
            },
            "storage": { "backend": self.storage.backend, "local_root": self.storage.local_root },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 8000),
        }
    }
}

// ── Logging ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Upper-cased level name, e.g. `INFO`, `DEBUG`, `WARNING`.
    pub level: String,
}

impl LogConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            level: profiled_env_or(p, "APP_LOG_LEVEL", "INFO").to_uppercase(),
        }
    }

    /// The `tracing` filter directive for the configured level.
    pub fn filter_directive(&self) -> Result<&'static str> {
        match self.level.as_str() {
            "TRACE" => Ok("trace"),
            "DEBUG" => Ok("debug"),
            "INFO" => Ok("info"),
            "WARN" | "WARNING" => Ok("warn"),
            "ERROR" | "CRITICAL" => Ok("error"),
            other => Err(HourloadError::Config(format!("Invalid log level: {}", other))),
        }
    }
}

// ── GCP defaults ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpConfig {
    /// Project used when a request doesn't name one.
    pub project_id: String,
    /// Location used when a request doesn't name one.
    pub region: String,
}

impl GcpConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            project_id: profiled_env_or(p, "GCP_PROJECT", "my-project"),
            region: profiled_env_or(p, "GCP_REGION", "us"),
        }
    }
}

// ── BigQuery ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BigQueryConfig {
    pub api_url: String,
    /// Static bearer token. When unset, tokens come from the metadata server.
    pub access_token: Option<String>,
    pub http_timeout_seconds: u64,
}

impl BigQueryConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            api_url: profiled_env_or(p, "BIGQUERY_API_URL", DEFAULT_BIGQUERY_API_URL)
                .trim_end_matches('/')
                .to_string(),
            access_token: profiled_env_opt(p, "BIGQUERY_ACCESS_TOKEN"),
            http_timeout_seconds: profiled_env_u64(p, "BIGQUERY_HTTP_TIMEOUT_SECONDS", 60),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "gcs" or "local"
    pub backend: String,
    /// Root directory of the local backend; each bucket is a sub-directory.
    pub local_root: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            backend: profiled_env_or(p, "STORAGE_BACKEND", "gcs").to_lowercase(),
            local_root: PathBuf::from(profiled_env_or(p, "STORAGE_LOCAL_ROOT", "data/buckets")),
        }
    }
}
