//! Blob storage for uploaded files.
//!
//! Callers only see the [`BlobStore`] trait and the [`StoredLocation`] it hands
//! back. The concrete backend is picked once at startup from `STORAGE_BACKEND`
//! (see [`build_blob_store`]).

pub mod fallback;
pub mod local;
pub mod s3;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, StorageBackend};

pub use fallback::FallbackStore;
pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

const S3_SCHEME: &str = "s3://";
const FILE_SCHEME: &str = "file://";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Invalid stored location: {0}")]
    InvalidLocation(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("No configured backend handles location {0}")]
    Unsupported(String),
}

/// Where a blob ended up. Persisted as a string in `files.stored_location`
/// with an explicit scheme so deletion never has to guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredLocation {
    Object { bucket: String, key: String },
    Local { path: PathBuf },
}

impl fmt::Display for StoredLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredLocation::Object { bucket, key } => write!(f, "{S3_SCHEME}{bucket}/{key}"),
            StoredLocation::Local { path } => write!(f, "{FILE_SCHEME}{}", path.display()),
        }
    }
}

impl FromStr for StoredLocation {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix(S3_SCHEME) {
            let (bucket, key) = rest
                .split_once('/')
                .filter(|(b, k)| !b.is_empty() && !k.is_empty())
                .ok_or_else(|| StorageError::InvalidLocation(s.to_string()))?;
            return Ok(StoredLocation::Object {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        if let Some(path) = s.strip_prefix(FILE_SCHEME) {
            if path.is_empty() {
                return Err(StorageError::InvalidLocation(s.to_string()));
            }
            return Ok(StoredLocation::Local {
                path: PathBuf::from(path),
            });
        }
        Err(StorageError::InvalidLocation(s.to_string()))
    }
}

/// A place uploaded bytes can be written to and later removed from.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this store owns `location` and can delete it.
    fn handles(&self, location: &StoredLocation) -> bool;

    /// Writes `bytes` under the relative `key` (for example `tasks/<id>/0-notes.pdf`).
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> Result<StoredLocation, StorageError>;

    async fn delete(&self, location: &StoredLocation) -> Result<(), StorageError>;
}

/// Builds the single blob store the service uses for its lifetime.
pub async fn build_blob_store(config: &Config) -> Result<Arc<dyn BlobStore>, StorageError> {
    let local = LocalBlobStore::new(config.local_storage_dir.clone()).await?;

    match (config.storage_backend, &config.s3) {
        (StorageBackend::S3, Some(settings)) => {
            let s3 = S3BlobStore::from_settings(settings).await;
            info!(
                "Blob storage: s3 bucket '{}' with local fallback at {}",
                settings.bucket,
                local.root().display()
            );
            Ok(Arc::new(FallbackStore::new(Arc::new(s3), Arc::new(local))))
        }
        (StorageBackend::S3, None) => Err(StorageError::Backend(
            "STORAGE_BACKEND=s3 but S3 settings are missing".to_string(),
        )),
        (StorageBackend::Local, _) => {
            info!("Blob storage: local directory {}", local.root().display());
            Ok(Arc::new(local))
        }
    }
}

/// Reduces an uploaded file name to a safe single path segment.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Storage key for the `index`-th file of a task.
pub fn task_file_key(task_id: uuid::Uuid, index: usize, file_name: &str) -> String {
    format!("tasks/{task_id}/{index}-{}", sanitize_file_name(file_name))
}
