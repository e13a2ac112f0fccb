use std::sync::Arc;

use crate::config::Config;
use crate::notifier::DispatchQueue;
use crate::storage::BlobStore;
use crate::store::TaskStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    /// Blob backend selected at startup from `STORAGE_BACKEND`.
    pub blobs: Arc<dyn BlobStore>,
    pub notifier: DispatchQueue,
    pub config: Config,
}
