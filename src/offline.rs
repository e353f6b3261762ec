//! Bulk download of every manifest resource for offline use

use crate::error::{AssetSyncError, AssetSyncResult};
use crate::manifest::ResourceManifest;
use crate::network::{fetch_all_ok, FetchRequest, Fetcher};
use crate::resource::Origin;
use crate::store::CacheStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Fills the content cache with every resource it does not hold yet
pub struct OfflineBulkFetcher {
    origin: Origin,
    fetcher: Arc<dyn Fetcher>,
    content: Arc<dyn CacheStore>,
    concurrency: usize,
}

impl OfflineBulkFetcher {
    pub fn new(
        origin: Origin,
        fetcher: Arc<dyn Fetcher>,
        content: Arc<dyn CacheStore>,
        concurrency: usize,
    ) -> Self {
        Self {
            origin,
            fetcher,
            content,
            concurrency,
        }
    }

    /// Manifest paths with no content cache entry, in manifest order
    pub async fn missing(&self, manifest: &ResourceManifest) -> AssetSyncResult<Vec<String>> {
        let present: HashSet<String> = self
            .content
            .keys()
            .await?
            .iter()
            .filter_map(|key| self.origin.path_of(key))
            .collect();

        Ok(manifest
            .paths()
            .filter(|path| !present.contains(*path))
            .map(str::to_string)
            .collect())
    }

    /// Fetch and cache every missing resource, returning how many were added.
    ///
    /// The batch is all-or-nothing: if any fetch fails nothing is stored.
    /// Running it again with the same manifest fetches nothing.
    pub async fn download_all(&self, manifest: &ResourceManifest) -> AssetSyncResult<usize> {
        let missing = self.missing(manifest).await?;
        if missing.is_empty() {
            debug!("All {} resources already cached", manifest.len());
            return Ok(0);
        }

        info!("Downloading {} resources for offline use", missing.len());
        let keys: Vec<String> = missing.iter().map(|p| self.origin.url_for(p)).collect();
        let requests: Vec<FetchRequest> = keys.iter().map(FetchRequest::new).collect();

        let responses = fetch_all_ok(self.fetcher.as_ref(), &requests, self.concurrency)
            .await
            .map_err(|e| AssetSyncError::OfflineFetch {
                failed: missing.len(),
                reason: e.to_string(),
            })?;

        for (key, response) in keys.iter().zip(&responses) {
            self.content.put(key, response).await?;
        }

        info!("Cached {} resources", responses.len());
        Ok(responses.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::testing::ScriptedFetcher;
    use crate::resource::Response;
    use crate::store::MemoryStore;

    const ORIGIN: &str = "https://app.test";

    fn manifest() -> ResourceManifest {
        ResourceManifest::from_entries([("/", "r"), ("main.js", "m"), ("logo.png", "l")])
    }

    fn serve_all(fetcher: &ScriptedFetcher) {
        fetcher.serve("https://app.test/", "root");
        fetcher.serve("https://app.test/main.js", "main");
        fetcher.serve("https://app.test/logo.png", "png");
    }

    fn bulk(fetcher: Arc<ScriptedFetcher>, content: Arc<MemoryStore>) -> OfflineBulkFetcher {
        OfflineBulkFetcher::new(Origin::new(ORIGIN).unwrap(), fetcher, content, 2)
    }

    #[tokio::test]
    async fn downloads_only_missing_paths() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        serve_all(&fetcher);
        let content = Arc::new(MemoryStore::new("content"));
        content
            .put("https://app.test/main.js", &Response::new(200, "main"))
            .await
            .unwrap();

        let added = bulk(fetcher.clone(), content.clone())
            .download_all(&manifest())
            .await
            .unwrap();

        assert_eq!(added, 2);
        let urls: Vec<String> = fetcher.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["https://app.test/", "https://app.test/logo.png"]);
        assert_eq!(content.len().await, 3);
    }

    #[tokio::test]
    async fn second_run_fetches_nothing() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        serve_all(&fetcher);
        let content = Arc::new(MemoryStore::new("content"));
        let bulk = bulk(fetcher.clone(), content);

        assert_eq!(bulk.download_all(&manifest()).await.unwrap(), 3);
        fetcher.reset_log();

        assert_eq!(bulk.download_all(&manifest()).await.unwrap(), 0);
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn failed_batch_stores_nothing() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.serve("https://app.test/", "root");
        fetcher.serve("https://app.test/main.js", "main");
        // logo.png answers 404
        let content = Arc::new(MemoryStore::new("content"));

        let err = bulk(fetcher, content.clone())
            .download_all(&manifest())
            .await
            .unwrap_err();

        match err {
            AssetSyncError::OfflineFetch { failed, reason } => {
                assert_eq!(failed, 3);
                assert!(reason.contains("logo.png"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(content.is_empty().await);
    }

    #[tokio::test]
    async fn foreign_keys_do_not_count_as_present() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let content = Arc::new(MemoryStore::new("content"));
        content
            .put("https://cdn.test/main.js", &Response::new(200, "x"))
            .await
            .unwrap();

        let missing = bulk(fetcher, content).missing(&manifest()).await.unwrap();
        assert_eq!(missing, vec!["/", "logo.png", "main.js"]);
    }
}
