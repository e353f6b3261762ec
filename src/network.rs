//! Network fetch collaborator
//!
//! [`Fetcher`] mirrors browser `fetch` semantics: any HTTP status is a
//! successful fetch, only transport failures are errors. Callers decide
//! whether a non-2xx response is cacheable.

use crate::error::{AssetSyncError, AssetSyncResult};
use crate::resource::Response;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// User agent for origin requests
const USER_AGENT_VALUE: &str = concat!("assetsync/", env!("CARGO_PKG_VERSION"));

/// How intermediate HTTP caches may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Normal HTTP caching rules apply
    #[default]
    Default,
    /// Bypass every intermediate HTTP cache
    Reload,
}

/// A request handed to the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub cache_mode: CacheMode,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cache_mode: CacheMode::Default,
        }
    }

    /// A request that must not be answered by an HTTP cache
    pub fn reload(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cache_mode: CacheMode::Reload,
        }
    }
}

/// Network primitive used by the installer, router and bulk fetcher
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a resource. Errors only on transport failure.
    async fn fetch(&self, request: &FetchRequest) -> AssetSyncResult<Response>;
}

/// Fetch every request, requiring a 2xx status for each.
///
/// Results come back in request order. The first failure aborts the batch
/// and is returned as [`AssetSyncError::Fetch`].
pub async fn fetch_all_ok(
    fetcher: &dyn Fetcher,
    requests: &[FetchRequest],
    concurrency: usize,
) -> AssetSyncResult<Vec<Response>> {
    stream::iter(requests)
        .map(|request| async move {
            let response = fetcher.fetch(request).await?;
            if !response.is_ok() {
                return Err(AssetSyncError::fetch(
                    &request.url,
                    format!("HTTP {}", response.status),
                ));
            }
            Ok(response)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

/// HTTP fetcher backed by a blocking `ureq` agent
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl HttpFetcher {
    /// Create a fetcher with a global per-request timeout
    pub fn new(timeout: Duration, max_body_bytes: u64) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: config.into(),
            max_body_bytes,
        }
    }

    fn fetch_blocking(
        agent: &ureq::Agent,
        request: &FetchRequest,
        max_body_bytes: u64,
    ) -> Result<Response, ureq::Error> {
        let mut builder = agent
            .get(request.url.as_str())
            .header("User-Agent", USER_AGENT_VALUE);

        if request.cache_mode == CacheMode::Reload {
            builder = builder
                .header("Cache-Control", "no-cache")
                .header("Pragma", "no-cache");
        }

        let mut response = builder.call()?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = response
            .body_mut()
            .with_config()
            .limit(max_body_bytes)
            .read_to_vec()?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> AssetSyncResult<Response> {
        debug!(url = %request.url, mode = ?request.cache_mode, "fetching");

        let agent = self.agent.clone();
        let owned = request.clone();
        let max_body_bytes = self.max_body_bytes;

        let result =
            tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &owned, max_body_bytes))
                .await
                .map_err(|e| AssetSyncError::Internal(format!("fetch task failed: {}", e)))?;

        let response = result.map_err(|e| AssetSyncError::fetch(&request.url, e))?;
        debug!(url = %request.url, status = response.status, bytes = response.body.len(), "fetched");
        Ok(response)
    }
}
