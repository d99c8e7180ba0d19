//! Admin bulk delete — walks the upload and chunk prefixes of a scope and
//! removes every blob, accumulating per-item errors instead of aborting.

use crate::services::blob_store::BlobStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Which scopes a purge covers. Anything other than an explicit `files` or
/// `pages` request purges everything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurgeScope {
    All,
    Files,
    Pages,
}

impl PurgeScope {
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value {
            Some("files") => PurgeScope::Files,
            Some("pages") => PurgeScope::Pages,
            _ => PurgeScope::All,
        }
    }

    /// Key prefixes swept by this purge scope.
    fn prefixes(self) -> &'static [&'static str] {
        match self {
            PurgeScope::Files => &["uploads/files/", "chunks/files/"],
            PurgeScope::Pages => &["uploads/pages/", "chunks/pages/"],
            PurgeScope::All => &[
                "uploads/files/",
                "uploads/pages/",
                "chunks/files/",
                "chunks/pages/",
            ],
        }
    }
}

/// Result of one purge run.
#[derive(Serialize, Debug)]
pub struct PurgeOutcome {
    pub deleted: u64,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct PurgeService {
    store: Arc<dyn BlobStore>,
}

impl PurgeService {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Delete everything under the scope's prefixes. A failed list or delete
    /// is recorded and the sweep continues with the next item.
    pub async fn purge(&self, scope: PurgeScope) -> PurgeOutcome {
        let mut deleted = 0u64;
        let mut errors = Vec::new();

        for prefix in scope.prefixes() {
            let listing = match self.store.list(prefix).await {
                Ok(listing) => listing,
                Err(err) => {
                    errors.push(format!("list failed for {prefix}: {err}"));
                    continue;
                }
            };
            for blob in listing {
                match self.store.delete(&blob.key).await {
                    Ok(()) => deleted += 1,
                    Err(err) => errors.push(format!("delete failed for {}: {}", blob.key, err)),
                }
            }
        }

        info!(
            "purge of {:?} removed {} blobs ({} errors)",
            scope,
            deleted,
            errors.len()
        );
        PurgeOutcome { deleted, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::blob_store::FsBlobStore;
    use bytes::Bytes;
    use tempfile::TempDir;

    async fn seeded_store() -> (TempDir, Arc<dyn BlobStore>) {
        let temp = tempfile::tempdir().expect("tempdir");
        let store: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(temp.path()));
        for key in [
            "uploads/files/1-a.txt",
            "uploads/pages/2-b.txt",
            "chunks/files/id1/chunk-0",
            "chunks/files/id1/manifest.json",
            "chunks/pages/id2/chunk-0",
        ] {
            store.put(key, Bytes::from_static(b"x")).await.unwrap();
        }
        (temp, store)
    }

    #[test]
    fn scope_parsing_defaults_to_all() {
        assert_eq!(PurgeScope::parse_lenient(Some("files")), PurgeScope::Files);
        assert_eq!(PurgeScope::parse_lenient(Some("pages")), PurgeScope::Pages);
        assert_eq!(PurgeScope::parse_lenient(Some("everything")), PurgeScope::All);
        assert_eq!(PurgeScope::parse_lenient(None), PurgeScope::All);
    }

    #[tokio::test]
    async fn files_purge_leaves_pages_untouched() {
        let (_temp, store) = seeded_store().await;
        let service = PurgeService::new(Arc::clone(&store));

        let outcome = service.purge(PurgeScope::Files).await;
        assert_eq!(outcome.deleted, 3);
        assert!(outcome.errors.is_empty());

        assert!(store.list("uploads/files/").await.unwrap().is_empty());
        assert!(store.list("chunks/files/").await.unwrap().is_empty());
        assert_eq!(store.list("uploads/pages/").await.unwrap().len(), 1);
        assert_eq!(store.list("chunks/pages/").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn full_purge_sweeps_every_prefix() {
        let (_temp, store) = seeded_store().await;
        let service = PurgeService::new(Arc::clone(&store));

        let outcome = service.purge(PurgeScope::All).await;
        assert_eq!(outcome.deleted, 5);
        assert!(outcome.errors.is_empty());
        assert!(store.list("uploads/").await.unwrap().is_empty());
        assert!(store.list("chunks/").await.unwrap().is_empty());
    }
}
