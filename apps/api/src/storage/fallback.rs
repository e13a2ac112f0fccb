use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use super::{BlobStore, StorageError, StoredLocation};

/// Tries `primary` once; on failure writes to `fallback` once. No retries.
///
/// Deletion goes to whichever store reports that it handles the location.
pub struct FallbackStore {
    primary: Arc<dyn BlobStore>,
    fallback: Arc<dyn BlobStore>,
}

impl FallbackStore {
    pub fn new(primary: Arc<dyn BlobStore>, fallback: Arc<dyn BlobStore>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl BlobStore for FallbackStore {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn handles(&self, location: &StoredLocation) -> bool {
        self.primary.handles(location) || self.fallback.handles(location)
    }

    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> Result<StoredLocation, StorageError> {
        // Bytes clones are refcounted, not copied.
        match self.primary.put(key, bytes.clone(), content_type).await {
            Ok(location) => Ok(location),
            Err(e) => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    key,
                    error = %e,
                    "Primary blob store failed, falling back"
                );
                self.fallback.put(key, bytes, content_type).await
            }
        }
    }

    async fn delete(&self, location: &StoredLocation) -> Result<(), StorageError> {
        if self.primary.handles(location) {
            self.primary.delete(location).await
        } else if self.fallback.handles(location) {
            self.fallback.delete(location).await
        } else {
            Err(StorageError::Unsupported(location.to_string()))
        }
    }
}
