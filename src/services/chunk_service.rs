//! Chunked transfer core — writer, reader, and key-naming helpers.
//!
//! A large file arrives as fixed-size pieces addressed by `(scope, file id,
//! index)`. Each piece is persisted independently at a deterministic key;
//! receiving the declared last index also writes a manifest describing how to
//! reassemble the file. Download lists the key prefix, orders chunks by their
//! embedded index, and streams their payloads back-to-back.

use crate::models::{manifest::Manifest, scope::StoreScope};
use crate::services::blob_store::{BlobMeta, BlobStore, BlobStoreError};
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use std::{
    io::{self, ErrorKind},
    sync::Arc,
};
use thiserror::Error;
use tracing::debug;

/// Root key segment under which all chunked uploads live.
pub const CHUNK_ROOT: &str = "chunks";

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("manifest not found")]
    ManifestNotFound,
    #[error("unable to read manifest: {0}")]
    ManifestUnreadable(String),
    #[error("no chunks found")]
    NoChunks,
    #[error(transparent)]
    Storage(#[from] BlobStoreError),
    #[error(transparent)]
    ManifestCodec(#[from] serde_json::Error),
}

pub type ChunkResult<T> = Result<T, ChunkError>;

/// Metadata accompanying one uploaded chunk.
#[derive(Clone, Debug)]
pub struct ChunkUpload {
    pub scope: StoreScope,
    pub file_id: String,
    pub chunk_index: u64,
    pub total_chunks: u64,
    pub total_size: u64,
    pub original_name: String,
    pub content_type: String,
}

/// Outcome of persisting one chunk.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChunkWriteResult {
    pub chunk_url: String,
    pub chunk_index: u64,
    pub total_chunks: u64,
    pub done: bool,
    pub manifest_url: Option<String>,
}

/// A reassembled download ready to be framed as an HTTP response.
///
/// The stream fetches chunks lazily in index order and is consumed exactly
/// once; a failed mid-stream fetch surfaces as a stream error after any
/// already-forwarded bytes.
pub struct ChunkDownload {
    pub manifest: Manifest,
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, io::Result<Bytes>>,
}

/// Key prefix holding every blob of one chunked upload.
pub fn chunk_prefix(scope: StoreScope, file_id: &str) -> String {
    format!("{CHUNK_ROOT}/{scope}/{file_id}/")
}

/// Deterministic key for one chunk.
pub fn chunk_key(scope: StoreScope, file_id: &str, index: u64) -> String {
    format!("{}chunk-{index}", chunk_prefix(scope, file_id))
}

/// Key of the manifest blob for one upload.
pub fn manifest_key(scope: StoreScope, file_id: &str) -> String {
    format!("{}manifest.json", chunk_prefix(scope, file_id))
}

/// Extract the ordering index embedded in a chunk key: the integer trailing
/// the last `chunk-` occurrence. Keys with a non-numeric suffix yield `None`
/// and are skipped during enumeration rather than failing the download.
pub fn parse_chunk_index(key: &str) -> Option<u64> {
    let (_, suffix) = key.rsplit_once("chunk-")?;
    suffix.parse().ok()
}

/// Chunk writer and reader over a shared blob store.
///
/// Stateless per request: all progress tracking lives with the caller, and
/// two concurrent writers under one file identifier interleave freely with
/// last-writer-wins semantics per chunk key and per manifest.
#[derive(Clone)]
pub struct ChunkService {
    store: Arc<dyn BlobStore>,

    /// When set, `Content-Length` is recomputed from the listed chunk sizes
    /// instead of trusting the manifest's declared total.
    strict_content_length: bool,
}

impl ChunkService {
    pub fn new(store: Arc<dyn BlobStore>, strict_content_length: bool) -> Self {
        Self {
            store,
            strict_content_length,
        }
    }

    /// Persist one chunk, overwriting any prior payload at the same index.
    ///
    /// Completion fires when the declared last index arrives, not when all
    /// indices have been observed; an out-of-order caller that sends only the
    /// final chunk still produces a manifest.
    pub async fn write_chunk(
        &self,
        upload: &ChunkUpload,
        payload: Bytes,
    ) -> ChunkResult<ChunkWriteResult> {
        if upload.file_id.trim().is_empty() {
            return Err(ChunkError::InvalidRequest("Missing file id.".into()));
        }
        if upload.total_chunks == 0 || upload.chunk_index >= upload.total_chunks {
            return Err(ChunkError::InvalidRequest("Invalid chunk indexes.".into()));
        }

        let key = chunk_key(upload.scope, &upload.file_id, upload.chunk_index);
        let chunk_url = self.store.put(&key, payload).await?;
        debug!(
            "stored chunk {}/{} for {}",
            upload.chunk_index, upload.total_chunks, upload.file_id
        );

        let done = upload.chunk_index == upload.total_chunks - 1;
        let manifest_url = if done {
            let manifest = Manifest {
                file_id: upload.file_id.clone(),
                store: upload.scope,
                original_name: upload.original_name.clone(),
                content_type: upload.content_type.clone(),
                total_size: upload.total_size,
                total_chunks: upload.total_chunks,
                chunk_prefix: chunk_prefix(upload.scope, &upload.file_id),
            };
            let body = serde_json::to_vec_pretty(&manifest)?;
            let url = self
                .store
                .put(
                    &manifest_key(upload.scope, &upload.file_id),
                    Bytes::from(body),
                )
                .await?;
            debug!("wrote manifest for {}", upload.file_id);
            Some(url)
        } else {
            None
        };

        Ok(ChunkWriteResult {
            chunk_url,
            chunk_index: upload.chunk_index,
            total_chunks: upload.total_chunks,
            done,
            manifest_url,
        })
    }

    /// Locate the manifest and open an ordered stream over the stored chunks.
    ///
    /// No gap or contiguity check is performed; whatever chunk keys exist
    /// under the prefix stream in ascending index order.
    pub async fn open_download(
        &self,
        scope: StoreScope,
        file_id: &str,
    ) -> ChunkResult<ChunkDownload> {
        if file_id.trim().is_empty() {
            return Err(ChunkError::InvalidRequest("Missing id".into()));
        }

        let prefix = chunk_prefix(scope, file_id);
        let listing = self.store.list(&prefix).await?;

        let manifest_meta = listing
            .iter()
            .find(|blob| blob.key.ends_with("manifest.json"))
            .ok_or(ChunkError::ManifestNotFound)?;
        let raw = self
            .store
            .fetch(&manifest_meta.key)
            .await
            .map_err(|err| ChunkError::ManifestUnreadable(err.to_string()))?;
        let manifest: Manifest = serde_json::from_slice(&raw)
            .map_err(|err| ChunkError::ManifestUnreadable(err.to_string()))?;

        let mut entries: Vec<(u64, BlobMeta)> = listing
            .into_iter()
            .filter(|blob| blob.key.contains("chunk-"))
            .filter_map(|blob| parse_chunk_index(&blob.key).map(|index| (index, blob)))
            .collect();
        entries.sort_by_key(|(index, _)| *index);

        if entries.is_empty() {
            return Err(ChunkError::NoChunks);
        }

        let content_length = if self.strict_content_length {
            Some(entries.iter().map(|(_, blob)| blob.size).sum())
        } else if manifest.total_size > 0 {
            Some(manifest.total_size)
        } else {
            None
        };

        let store = Arc::clone(&self.store);
        let stream = stream::iter(entries)
            .then(move |(_, blob)| {
                let store = Arc::clone(&store);
                async move {
                    store
                        .fetch(&blob.key)
                        .await
                        .map_err(|err| io::Error::new(ErrorKind::Other, err))
                }
            })
            .boxed();

        Ok(ChunkDownload {
            manifest,
            content_length,
            stream,
        })
    }
}
