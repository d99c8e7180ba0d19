//! Records returned by the single-shot upload endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Response body for a completed single-shot upload.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    /// Stored name, timestamp-prefixed for disambiguation.
    pub file_name: String,

    /// Locator assigned by the blob store.
    pub stored_at: String,

    /// Payload size in bytes.
    pub bytes: u64,

    /// MD5 checksum of the payload.
    pub etag: String,
}

/// One entry in an upload listing.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadEntry {
    /// Stored name (last key segment).
    pub name: String,

    /// Locator assigned by the blob store.
    pub url: String,

    /// Size in bytes when the store reports one.
    pub size: Option<u64>,

    /// Last-modified time when the store reports one.
    pub uploaded_at: Option<DateTime<Utc>>,
}
