use std::time::Duration;

use moondance_pipeline::PipelineConfig;
use moondance_storage::S3Config;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Lifetime of presigned view/download URLs in seconds (default: `300`).
    pub presign_ttl_secs: u64,
    /// JWT token configuration (secret, expiry duration).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `PRESIGN_TTL_SECS`     | `300`                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let presign_ttl_secs: u64 = std::env::var("PRESIGN_TTL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("PRESIGN_TTL_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            presign_ttl_secs,
            jwt,
        }
    }

    /// Presign TTL as a [`Duration`].
    pub fn presign_ttl(&self) -> Duration {
        Duration::from_secs(self.presign_ttl_secs)
    }
}

/// Load S3 connection settings from environment variables.
///
/// | Env Var               | Required | Default     |
/// |-----------------------|----------|-------------|
/// | `S3_BUCKET`           | **yes**  | --          |
/// | `S3_REGION`           | no       | `us-east-1` |
/// | `S3_ENDPOINT_URL`     | no       | unset       |
/// | `S3_FORCE_PATH_STYLE` | no       | `false`     |
///
/// # Panics
///
/// Panics if `S3_BUCKET` is not set.
pub fn storage_config_from_env() -> S3Config {
    S3Config {
        bucket: std::env::var("S3_BUCKET").expect("S3_BUCKET must be set"),
        region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
        endpoint_url: std::env::var("S3_ENDPOINT_URL").ok(),
        force_path_style: std::env::var("S3_FORCE_PATH_STYLE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false),
    }
}

/// Load extraction pipeline tuning from environment variables.
///
/// | Env Var                    | Default |
/// |----------------------------|---------|
/// | `PIPELINE_WORKERS`         | `4`     |
/// | `PIPELINE_BACKLOG`         | `100`   |
/// | `PIPELINE_JOB_TIMEOUT_SECS`| `120`   |
pub fn pipeline_config_from_env() -> PipelineConfig {
    let defaults = PipelineConfig::default();

    let workers: usize = std::env::var("PIPELINE_WORKERS")
        .unwrap_or_else(|_| defaults.workers.to_string())
        .parse()
        .expect("PIPELINE_WORKERS must be a valid usize");

    let backlog: usize = std::env::var("PIPELINE_BACKLOG")
        .unwrap_or_else(|_| defaults.backlog.to_string())
        .parse()
        .expect("PIPELINE_BACKLOG must be a valid usize");

    let job_timeout_secs: u64 = std::env::var("PIPELINE_JOB_TIMEOUT_SECS")
        .unwrap_or_else(|_| defaults.job_timeout.as_secs().to_string())
        .parse()
        .expect("PIPELINE_JOB_TIMEOUT_SECS must be a valid u64");

    PipelineConfig {
        workers,
        backlog,
        job_timeout: Duration::from_secs(job_timeout_secs),
    }
}
