//! Shell installation into the staging cache

use crate::error::{AssetSyncError, AssetSyncResult};
use crate::manifest::ShellSet;
use crate::network::{fetch_all_ok, FetchRequest, Fetcher};
use crate::resource::Origin;
use crate::store::CacheStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Fetches the shell resources with cache-bypass semantics and stages them
pub struct ShellInstaller {
    origin: Origin,
    fetcher: Arc<dyn Fetcher>,
    staging: Arc<dyn CacheStore>,
    concurrency: usize,
}

impl ShellInstaller {
    pub fn new(
        origin: Origin,
        fetcher: Arc<dyn Fetcher>,
        staging: Arc<dyn CacheStore>,
        concurrency: usize,
    ) -> Self {
        Self {
            origin,
            fetcher,
            staging,
            concurrency,
        }
    }

    /// Stage every shell resource, returning how many were staged.
    ///
    /// All fetches must succeed before anything is written, so a failed
    /// attempt leaves staging as it was. A successful attempt replaces
    /// whatever an earlier, never-activated install staged. The content
    /// cache is never touched.
    pub async fn install(&self, shell: &ShellSet) -> AssetSyncResult<usize> {
        let keys: Vec<String> = shell.iter().map(|p| self.origin.url_for(p)).collect();
        let requests: Vec<FetchRequest> = keys.iter().map(FetchRequest::reload).collect();

        debug!("Fetching {} shell resources", requests.len());
        let responses = fetch_all_ok(self.fetcher.as_ref(), &requests, self.concurrency)
            .await
            .map_err(|e| self.install_error(e))?;

        self.staging.clear().await?;
        for (key, response) in keys.iter().zip(&responses) {
            self.staging.put(key, response).await?;
        }

        info!("Staged {} shell resources", responses.len());
        Ok(responses.len())
    }

    fn install_error(&self, err: AssetSyncError) -> AssetSyncError {
        match err {
            AssetSyncError::Fetch { url, reason } => AssetSyncError::Install {
                path: self.origin.path_of(&url).unwrap_or(url),
                reason,
            },
            other => other,
        }
    }
}
