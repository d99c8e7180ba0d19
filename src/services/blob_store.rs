//! Blob store collaborator — put/list/fetch/delete by hierarchical string key.
//!
//! The rest of the service only ever talks to the `BlobStore` trait, which
//! mirrors the surface of a hosted blob API. `FsBlobStore` is the local
//! implementation: keys map to paths under a base directory, writes go
//! through a temp file and an atomic rename, and listing is a directory walk.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_BLOB_KEY_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("blob `{0}` not found")]
    NotFound(String),
    #[error("invalid blob key")]
    InvalidKey,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type BlobResult<T> = Result<T, BlobStoreError>;

/// One listing entry under a prefix.
#[derive(Clone, Debug)]
pub struct BlobMeta {
    pub key: String,
    pub url: String,
    pub size: u64,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// External object-storage surface: atomic per-key put, consistent
/// list-after-write, fetch and delete by key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `contents` at `key`, unconditionally overwriting any prior
    /// value. Returns the store-assigned locator for the blob.
    async fn put(&self, key: &str, contents: Bytes) -> BlobResult<String>;

    /// List every blob whose key starts with `prefix`, ordered by key.
    async fn list(&self, prefix: &str) -> BlobResult<Vec<BlobMeta>>;

    /// Read the full payload stored at `key`.
    async fn fetch(&self, key: &str) -> BlobResult<Bytes>;

    /// Remove the blob at `key`.
    async fn delete(&self, key: &str) -> BlobResult<()>;
}

/// Filesystem-backed blob store used for local deployments and tests.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    base_path: PathBuf,
}

impl FsBlobStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Basic key validation to avoid trivial path traversal vectors.
    ///
    /// Rejects keys that begin with `/` or contain `..`, plus control
    /// characters and backslashes that would not survive a path mapping.
    fn ensure_key_safe(key: &str, allow_empty: bool) -> BlobResult<()> {
        if key.is_empty() {
            return if allow_empty {
                Ok(())
            } else {
                Err(BlobStoreError::InvalidKey)
            };
        }
        if key.len() > MAX_BLOB_KEY_LEN {
            return Err(BlobStoreError::InvalidKey);
        }
        if key.starts_with('/') || key.contains("..") {
            return Err(BlobStoreError::InvalidKey);
        }
        if key
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
        {
            return Err(BlobStoreError::InvalidKey);
        }
        Ok(())
    }

    fn blob_path(&self, key: &str) -> BlobResult<PathBuf> {
        Self::ensure_key_safe(key, false)?;
        if key.ends_with('/') {
            return Err(BlobStoreError::InvalidKey);
        }
        Ok(self.base_path.join(key))
    }

    /// URL path under which the blob route serves this key.
    fn locator(&self, key: &str) -> String {
        format!("/blobs/{key}")
    }

    /// Recursively remove empty directories up to the store root.
    ///
    /// Stops on the first non-empty or missing directory.
    async fn prune_empty_dirs(&self, start: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(&self.base_path) && current != self.base_path {
            match fs::remove_dir(&current).await {
                Ok(_) => {
                    if let Some(parent) = current.parent() {
                        current = parent.to_path_buf();
                    } else {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    /// Write bytes to a temporary file, fsync, then atomically rename into
    /// the final location. Temp files are cleaned up on every error path.
    async fn put(&self, key: &str, contents: Bytes) -> BlobResult<String> {
        let file_path = self.blob_path(key)?;
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            BlobStoreError::Io(io::Error::new(
                ErrorKind::Other,
                "blob path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        if let Err(err) = file.write_all(&contents).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobStoreError::Io(err));
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobStoreError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobStoreError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(BlobStoreError::Io(err));
            }
        }

        debug!("stored blob at key {}", key);
        Ok(self.locator(key))
    }

    async fn list(&self, prefix: &str) -> BlobResult<Vec<BlobMeta>> {
        Self::ensure_key_safe(prefix, true)?;

        // Walk from the directory portion of the prefix so a listing of
        // `chunks/files/abc/` does not scan unrelated scopes.
        let dir_part = prefix.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        let root = if dir_part.is_empty() {
            self.base_path.clone()
        } else {
            self.base_path.join(dir_part)
        };

        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(dir) = stack.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let meta = entry.metadata().await?;
                if meta.is_dir() {
                    stack.push(path);
                    continue;
                }
                // In-flight temp files are not visible blobs.
                if entry.file_name().to_string_lossy().starts_with(".tmp-") {
                    continue;
                }
                let Ok(rel) = path.strip_prefix(&self.base_path) else {
                    continue;
                };
                let key = rel.to_string_lossy().replace('\\', "/");
                if !key.starts_with(prefix) {
                    continue;
                }
                let url = self.locator(&key);
                out.push(BlobMeta {
                    key,
                    url,
                    size: meta.len(),
                    uploaded_at: meta.modified().ok().map(DateTime::<Utc>::from),
                });
            }
        }

        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    async fn fetch(&self, key: &str) -> BlobResult<Bytes> {
        let path = self.blob_path(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(BlobStoreError::NotFound(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        let path = self.blob_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => debug!("removed blob {}", path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(BlobStoreError::NotFound(key.to_string()));
            }
            Err(err) => return Err(err.into()),
        }
        if let Some(parent) = path.parent() {
            self.prune_empty_dirs(parent).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store() -> (TempDir, FsBlobStore) {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(temp.path());
        (temp, store)
    }

    #[tokio::test]
    async fn put_fetch_roundtrip_and_locator() {
        let (_temp, store) = make_store();
        let url = store
            .put("uploads/files/a.txt", Bytes::from_static(b"hello"))
            .await
            .expect("put");
        assert_eq!(url, "/blobs/uploads/files/a.txt");
        let bytes = store.fetch("uploads/files/a.txt").await.expect("fetch");
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn put_overwrites_existing_key() {
        let (_temp, store) = make_store();
        store
            .put("k/v", Bytes::from_static(b"first"))
            .await
            .expect("put");
        store
            .put("k/v", Bytes::from_static(b"second"))
            .await
            .expect("overwrite");
        let bytes = store.fetch("k/v").await.expect("fetch");
        assert_eq!(&bytes[..], b"second");
    }

    #[tokio::test]
    async fn list_filters_by_prefix_and_sorts() {
        let (_temp, store) = make_store();
        store.put("a/2", Bytes::from_static(b"xx")).await.unwrap();
        store.put("a/1", Bytes::from_static(b"x")).await.unwrap();
        store.put("b/1", Bytes::from_static(b"y")).await.unwrap();

        let listing = store.list("a/").await.expect("list");
        let keys: Vec<_> = listing.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["a/1", "a/2"]);
        assert_eq!(listing[0].size, 1);
        assert_eq!(listing[1].size, 2);
        assert!(listing[0].uploaded_at.is_some());
    }

    #[tokio::test]
    async fn list_missing_prefix_is_empty() {
        let (_temp, store) = make_store();
        assert!(store.list("nothing/here/").await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn delete_removes_blob_and_errors_when_absent() {
        let (temp, store) = make_store();
        store
            .put("x/y/z", Bytes::from_static(b"data"))
            .await
            .unwrap();
        store.delete("x/y/z").await.expect("delete");
        assert!(matches!(
            store.fetch("x/y/z").await,
            Err(BlobStoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("x/y/z").await,
            Err(BlobStoreError::NotFound(_))
        ));
        // empty parent directories are pruned back to the root
        assert!(!temp.path().join("x").exists());
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let (_temp, store) = make_store();
        for key in ["../escape", "/absolute", "a/../b", ""] {
            assert!(matches!(
                store.put(key, Bytes::from_static(b"nope")).await,
                Err(BlobStoreError::InvalidKey)
            ));
        }
    }
}
