use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Default per-file upload ceiling (30 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 30 * 1024 * 1024;
const DEFAULT_MAX_REQUEST_BYTES: usize = 128 * 1024 * 1024;

/// Which blob backend the service writes uploads to. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Object storage, with the local directory as the single fallback.
    S3,
    /// Local directory only.
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            other => bail!("STORAGE_BACKEND must be 's3' or 'local', got '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone)]
pub struct NotifierSettings {
    /// Downstream processor URL. `None` disables dispatch.
    pub processor_url: Option<String>,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    /// Deliveries allowed in flight at once.
    pub max_in_flight: usize,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub storage_backend: StorageBackend,
    /// Present iff `storage_backend` is `S3`.
    pub s3: Option<S3Settings>,
    pub local_storage_dir: PathBuf,
    pub notifier: NotifierSettings,
    pub max_upload_bytes: usize,
    pub max_request_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage_backend: StorageBackend = optional_env("STORAGE_BACKEND")
            .unwrap_or_else(|| "local".to_string())
            .parse()?;

        let s3 = match storage_backend {
            StorageBackend::S3 => Some(S3Settings {
                bucket: require_env("S3_BUCKET")?,
                endpoint: require_env("S3_ENDPOINT")?,
                region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
            StorageBackend::Local => None,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            storage_backend,
            s3,
            local_storage_dir: optional_env("LOCAL_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("docs/input")),
            notifier: NotifierSettings {
                processor_url: optional_env("TASK_PROCESSOR_URL"),
                max_attempts: parse_env("NOTIFIER_MAX_ATTEMPTS", 3)?,
                initial_backoff: Duration::from_millis(parse_env("NOTIFIER_BACKOFF_MS", 500)?),
                max_in_flight: parse_env("NOTIFIER_MAX_IN_FLIGHT", 8)?,
            },
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            max_request_bytes: parse_env("MAX_REQUEST_BYTES", DEFAULT_MAX_REQUEST_BYTES)?,
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
impl Config {
    /// Local storage, notifier disabled, default limits.
    pub fn for_tests(local_storage_dir: PathBuf) -> Self {
        Config {
            database_url: "postgres://localhost/eduhelp_test".to_string(),
            storage_backend: StorageBackend::Local,
            s3: None,
            local_storage_dir,
            notifier: NotifierSettings {
                processor_url: None,
                max_attempts: 1,
                initial_backoff: Duration::from_millis(1),
                max_in_flight: 1,
            },
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads a variable, treating an empty value the same as an unset one.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
