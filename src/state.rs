//! Shared application state handed to every handler by the router.

use crate::config::AppConfig;
use crate::services::{
    blob_store::BlobStore, chunk_service::ChunkService, purge_service::PurgeService,
    upload_service::UploadService,
};
use std::sync::Arc;

/// Cloneable bundle of the services and the process-wide configuration.
/// Configuration is constructed once at startup and passed in explicitly;
/// nothing below this layer reads the environment.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlobStore>,
    pub chunks: ChunkService,
    pub uploads: UploadService,
    pub purge: PurgeService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn BlobStore>, config: Arc<AppConfig>) -> Self {
        Self {
            chunks: ChunkService::new(Arc::clone(&store), config.strict_content_length),
            uploads: UploadService::new(Arc::clone(&store)),
            purge: PurgeService::new(Arc::clone(&store)),
            store,
            config,
        }
    }
}
