use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::ingest::BothScopesPlacement;
use crate::resume::reorder::DEFAULT_HOVER_THROTTLE;

const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// S3 / MinIO settings for the generated-document archive.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Snapshots live in memory when unset.
    pub redis_url: Option<String>,
    pub snapshot_key_prefix: String,
    pub craft_service_url: String,
    pub document_service_url: String,
    /// The archive is disabled when `S3_BUCKET` is unset.
    pub s3: Option<S3Config>,
    pub port: u16,
    pub rust_log: String,
    pub drag_throttle: Duration,
    pub both_scopes_placement: BothScopesPlacement,
    /// Live sessions untouched for this long are dropped from memory.
    pub session_idle: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("Required environment variable '{key}' is not set"))
        };

        let s3 = match get("S3_BUCKET").filter(|v| !v.trim().is_empty()) {
            Some(bucket) => Some(S3Config {
                bucket,
                endpoint: require("S3_ENDPOINT")?,
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            }),
            None => None,
        };

        let drag_throttle = match get("DRAG_THROTTLE_MS") {
            Some(ms) => Duration::from_millis(
                ms.trim()
                    .parse::<u64>()
                    .context("DRAG_THROTTLE_MS must be a whole number of milliseconds")?,
            ),
            None => DEFAULT_HOVER_THROTTLE,
        };

        let session_idle = match get("SESSION_IDLE_SECS") {
            Some(secs) => Duration::from_secs(
                secs.trim()
                    .parse::<u64>()
                    .context("SESSION_IDLE_SECS must be a whole number of seconds")?,
            ),
            None => DEFAULT_SESSION_IDLE,
        };

        let both_scopes_placement = match get("BOTH_SCOPES_PLACEMENT") {
            Some(raw) => raw
                .parse::<BothScopesPlacement>()
                .map_err(|e| anyhow!("BOTH_SCOPES_PLACEMENT: {e}"))?,
            None => BothScopesPlacement::default(),
        };

        Ok(Config {
            redis_url: get("REDIS_URL").filter(|v| !v.trim().is_empty()),
            snapshot_key_prefix: get("SNAPSHOT_KEY_PREFIX").unwrap_or_else(|| "resume".to_string()),
            craft_service_url: require("CRAFT_SERVICE_URL")?,
            document_service_url: require("DOCUMENT_SERVICE_URL")?,
            s3,
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            drag_throttle,
            both_scopes_placement,
            session_idle,
        })
    }
}
