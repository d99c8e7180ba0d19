//! Single-shot uploads — store a whole file under a timestamped name and
//! list what has been stored, with a documented fuzzy name lookup.

use crate::models::{
    scope::StoreScope,
    upload::{UploadEntry, UploadReceipt},
};
use crate::services::blob_store::{BlobResult, BlobStore};
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Root key segment under which single-shot uploads live.
pub const UPLOAD_ROOT: &str = "uploads";

/// Key prefix holding every single-shot upload of one scope.
pub fn upload_prefix(scope: StoreScope) -> String {
    format!("{UPLOAD_ROOT}/{scope}/")
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_` so client names
/// are safe as key segments.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Name lookup rule: exact match first, then a fallback that strips one
/// generated disambiguation suffix from the candidate's stem, so that
/// `report-x8Kq2.pdf` matches a request for `report.pdf`.
pub fn matches_upload_name(candidate: &str, requested: &str) -> bool {
    if candidate == requested {
        return true;
    }
    strip_disambiguation_suffix(candidate)
        .map(|stripped| stripped == requested)
        .unwrap_or(false)
}

/// Remove a trailing `-token` from the stem when the token is a plain
/// alphanumeric run: `notes-XyZ.txt` -> `notes.txt`, `notes-XyZ` -> `notes`.
fn strip_disambiguation_suffix(name: &str) -> Option<String> {
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (name, None),
    };
    let (base, token) = stem.rsplit_once('-')?;
    if base.is_empty() || token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(match ext {
        Some(ext) => format!("{base}.{ext}"),
        None => base.to_string(),
    })
}

/// Whole-file upload and listing operations over the shared blob store.
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn BlobStore>,
}

impl UploadService {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Store one complete payload under `uploads/{scope}/{millis}-{name}`.
    ///
    /// The millisecond timestamp prefix keeps repeated uploads of the same
    /// client name from overwriting each other. Returns the stored name, the
    /// locator, the byte count, and an md5 etag of the payload.
    pub async fn store_upload(
        &self,
        scope: StoreScope,
        original_name: &str,
        payload: Bytes,
    ) -> BlobResult<UploadReceipt> {
        let name = if original_name.trim().is_empty() {
            "upload.bin"
        } else {
            original_name
        };
        let file_name = format!("{}-{}", Utc::now().timestamp_millis(), sanitize_file_name(name));
        let key = format!("{}{}", upload_prefix(scope), file_name);

        let bytes = payload.len() as u64;
        let etag = format!("{:x}", md5::compute(&payload));
        let stored_at = self.store.put(&key, payload).await?;
        debug!("stored upload {} ({} bytes)", file_name, bytes);

        Ok(UploadReceipt {
            file_name,
            stored_at,
            bytes,
            etag,
        })
    }

    /// List stored uploads for a scope, optionally filtered by name using
    /// [`matches_upload_name`].
    pub async fn list_uploads(
        &self,
        scope: StoreScope,
        name: Option<&str>,
    ) -> BlobResult<Vec<UploadEntry>> {
        let listing = self.store.list(&upload_prefix(scope)).await?;
        let mut files: Vec<UploadEntry> = listing
            .into_iter()
            .map(|meta| {
                let name = meta
                    .key
                    .rsplit('/')
                    .next()
                    .unwrap_or("file")
                    .to_string();
                UploadEntry {
                    name,
                    url: meta.url,
                    size: Some(meta.size),
                    uploaded_at: meta.uploaded_at,
                }
            })
            .collect();

        if let Some(requested) = name {
            files.retain(|entry| matches_upload_name(&entry.name, requested));
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::blob_store::FsBlobStore;
    use tempfile::TempDir;

    fn make_service() -> (TempDir, UploadService) {
        let temp = tempfile::tempdir().expect("tempdir");
        let store: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(temp.path()));
        (temp, UploadService::new(store))
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("my file (1).txt"), "my_file__1_.txt");
        assert_eq!(sanitize_file_name("safe-name_0.bin"), "safe-name_0.bin");
        assert_eq!(sanitize_file_name("päth/slash"), "p_th_slash");
    }

    #[test]
    fn name_matching_is_exact_first_then_suffix_stripped() {
        assert!(matches_upload_name("report.pdf", "report.pdf"));
        assert!(matches_upload_name("report-x8Kq2.pdf", "report.pdf"));
        assert!(matches_upload_name("notes-XyZ", "notes"));
        assert!(!matches_upload_name("other.pdf", "report.pdf"));
        // token containing non-alphanumerics is not a generated suffix
        assert!(!matches_upload_name("a-b c.txt", "a.txt"));
        assert!(!matches_upload_name("-token.txt", ".txt"));
    }

    #[tokio::test]
    async fn store_then_list_roundtrip() {
        let (_temp, service) = make_service();
        let receipt = service
            .store_upload(StoreScope::Files, "hello world.txt", Bytes::from_static(b"hi"))
            .await
            .expect("store");
        assert!(receipt.file_name.ends_with("-hello_world.txt"));
        assert_eq!(receipt.bytes, 2);
        assert_eq!(receipt.stored_at, format!("/blobs/uploads/files/{}", receipt.file_name));

        let files = service
            .list_uploads(StoreScope::Files, None)
            .await
            .expect("list");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, receipt.file_name);
        assert_eq!(files[0].size, Some(2));
        assert!(files[0].uploaded_at.is_some());
    }

    #[tokio::test]
    async fn listing_is_scoped_and_name_filtered() {
        let (_temp, service) = make_service();
        let receipt = service
            .store_upload(StoreScope::Files, "a.txt", Bytes::from_static(b"a"))
            .await
            .unwrap();
        service
            .store_upload(StoreScope::Pages, "b.txt", Bytes::from_static(b"b"))
            .await
            .unwrap();

        let pages = service.list_uploads(StoreScope::Pages, None).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].name.ends_with("-b.txt"));

        let hit = service
            .list_uploads(StoreScope::Files, Some(&receipt.file_name))
            .await
            .unwrap();
        assert_eq!(hit.len(), 1);

        let miss = service
            .list_uploads(StoreScope::Files, Some("nope.txt"))
            .await
            .unwrap();
        assert!(miss.is_empty());
    }
}
