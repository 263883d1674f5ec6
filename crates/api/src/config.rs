use std::path::PathBuf;

use batchtone_core::upload::{UploadLimits, MAX_FILE_SIZE_MB, MAX_IMAGES_PER_BATCH};
use batchtone_engine::recovery::DEFAULT_STUCK_AFTER_MINUTES;

use crate::auth::session::SessionConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the session secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// PostgreSQL URL. When unset the service runs on the in-memory store.
    pub database_url: Option<String>,
    /// Directory the local blob store writes under (default: `./blobs`).
    pub blob_root: PathBuf,
    /// URL prefix the blob directory is served at.
    pub public_blob_base_url: String,
    pub session: SessionConfig,
    pub limits: UploadLimits,
    /// Minutes after which a `processing` image is re-armed (default: `10`).
    pub stuck_processing_minutes: i64,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: &str) -> T {
    env_or(key, default)
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>()))
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                        |
    /// |----------------------------|--------------------------------|
    /// | `HOST`                     | `0.0.0.0`                      |
    /// | `PORT`                     | `3000`                         |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`        |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                           |
    /// | `DATABASE_URL`             | unset (in-memory store)        |
    /// | `BLOB_ROOT`                | `./blobs`                      |
    /// | `PUBLIC_BLOB_BASE_URL`     | `http://localhost:3000/blobs`  |
    /// | `SESSION_SECRET`           | **required**                   |
    /// | `SESSION_EXPIRY_DAYS`      | `30`                           |
    /// | `MAX_IMAGES_PER_BATCH`     | `25`                           |
    /// | `MAX_FILE_SIZE_MB`         | `20`                           |
    /// | `STUCK_PROCESSING_MINUTES` | `10`                           |
    ///
    /// # Panics
    ///
    /// Panics on a missing `SESSION_SECRET` or an unparsable value, so
    /// misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let cors_origins = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty());

        let max_file_size_mb: u64 = parse_env("MAX_FILE_SIZE_MB", &MAX_FILE_SIZE_MB.to_string());
        let limits = UploadLimits {
            max_images_per_batch: parse_env(
                "MAX_IMAGES_PER_BATCH",
                &MAX_IMAGES_PER_BATCH.to_string(),
            ),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
        };

        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", "3000"),
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", "30"),
            database_url,
            blob_root: PathBuf::from(env_or("BLOB_ROOT", "./blobs")),
            public_blob_base_url: env_or("PUBLIC_BLOB_BASE_URL", "http://localhost:3000/blobs"),
            session: SessionConfig::from_env(),
            limits,
            stuck_processing_minutes: parse_env(
                "STUCK_PROCESSING_MINUTES",
                &DEFAULT_STUCK_AFTER_MINUTES.to_string(),
            ),
        }
    }

    /// Largest request body the upload routes accept: a full batch of
    /// maximum-size files plus multipart overhead.
    pub fn max_upload_body_bytes(&self) -> usize {
        let files = self.limits.max_file_size_bytes as usize * self.limits.max_images_per_batch;
        files + 1024 * 1024
    }
}
