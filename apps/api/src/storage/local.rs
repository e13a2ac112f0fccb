use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use super::{BlobStore, StorageError, StoredLocation};

/// Writes blobs beneath a single root directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Creates the root directory if needed and canonicalizes it.
    pub async fn new(root: PathBuf) -> Result<Self, StorageError> {
        tokio::fs::create_dir_all(&root).await?;
        let root = tokio::fs::canonicalize(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_key(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn owns(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
            && path
                .components()
                .all(|c| !matches!(c, Component::ParentDir))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn handles(&self, location: &StoredLocation) -> bool {
        matches!(location, StoredLocation::Local { path } if self.owns(path))
    }

    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: Option<&str>,
    ) -> Result<StoredLocation, StorageError> {
        let path = self.resolve_key(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = bytes.len();
        tokio::fs::write(&path, &bytes).await?;
        info!("Stored {size} bytes at {}", path.display());
        Ok(StoredLocation::Local { path })
    }

    async fn delete(&self, location: &StoredLocation) -> Result<(), StorageError> {
        if !self.handles(location) {
            return Err(StorageError::Unsupported(location.to_string()));
        }
        let StoredLocation::Local { path } = location else {
            return Err(StorageError::Unsupported(location.to_string()));
        };
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!("Removed {}", path.display());
                Ok(())
            }
            // Already gone counts as deleted.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
