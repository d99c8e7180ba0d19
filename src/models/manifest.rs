//! Reassembly manifest for a chunked upload.

use crate::models::scope::StoreScope;
use serde::{Deserialize, Serialize};

/// Metadata record written next to the chunks of one upload, once the chunk
/// with the declared last index has been received.
///
/// The manifest is the sole authority for the download's content type,
/// disposition filename, and declared length. Chunk presence and ordering
/// are re-derived from a prefix listing, never trusted from `total_chunks`.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Client-generated opaque identifier scoping this upload.
    pub file_id: String,

    /// Scope the chunks were written under.
    pub store: StoreScope,

    /// Original filename as reported by the client.
    pub original_name: String,

    /// Declared content type (MIME).
    pub content_type: String,

    /// Declared total byte size of the reassembled file.
    pub total_size: u64,

    /// Declared number of chunks.
    pub total_chunks: u64,

    /// Key prefix under which the chunks live.
    pub chunk_prefix: String,
}
