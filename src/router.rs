//! Request routing between the content cache and the network
//!
//! Only `GET` requests for manifest paths are handled. The root document
//! is fetched online-first; every other resource is served cache-first and
//! populated lazily on a miss.

use crate::error::AssetSyncResult;
use crate::manifest::ResourceManifest;
use crate::network::{FetchRequest, Fetcher};
use crate::resource::{Method, Origin, Request, Response, ROOT_PATH};
use crate::store::CacheStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// How a handled request is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    /// Serve from cache, fetch and populate on miss
    CacheFirst,
    /// Fetch first, fall back to cache when the network fails
    OnlineFirst,
}

/// A request the router has decided to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Logical manifest path
    pub path: String,

    /// Canonical content cache key
    pub key: String,

    /// URL sent to the network, cache-buster included
    pub url: String,

    pub policy: RoutePolicy,
}

/// Routes resource requests for one deployed manifest
pub struct RequestRouter {
    origin: Origin,
    manifest: Arc<ResourceManifest>,
    fetcher: Arc<dyn Fetcher>,
    content: Arc<dyn CacheStore>,
}

impl RequestRouter {
    pub fn new(
        origin: Origin,
        manifest: Arc<ResourceManifest>,
        fetcher: Arc<dyn Fetcher>,
        content: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            origin,
            manifest,
            fetcher,
            content,
        }
    }

    /// Decide whether and how to handle a request.
    ///
    /// `None` means the request is passed through to default network
    /// handling: non-`GET` methods, foreign origins and unlisted paths.
    pub fn route(&self, request: &Request) -> Option<Route> {
        if request.method != Method::Get {
            return None;
        }

        let path = self.origin.resolve(&request.url)?;
        if !self.manifest.contains(&path) {
            return None;
        }

        let policy = if path == ROOT_PATH {
            RoutePolicy::OnlineFirst
        } else {
            RoutePolicy::CacheFirst
        };

        // Fragments never reach the network
        let key = self.origin.url_for(&path);
        let url = match request.url.split_once('#') {
            Some((base, _)) => base,
            None => request.url.as_str(),
        };
        let url = if url == self.origin.as_str() {
            key.clone()
        } else {
            url.to_string()
        };

        Some(Route {
            path,
            key,
            url,
            policy,
        })
    }

    /// Produce the response for a routed request
    pub async fn respond(&self, route: &Route) -> AssetSyncResult<Response> {
        match route.policy {
            RoutePolicy::CacheFirst => self.cache_first(route).await,
            RoutePolicy::OnlineFirst => self.online_first(route).await,
        }
    }

    /// Route and respond in one step
    pub async fn handle(&self, request: &Request) -> Option<AssetSyncResult<Response>> {
        let route = self.route(request)?;
        Some(self.respond(&route).await)
    }

    async fn cache_first(&self, route: &Route) -> AssetSyncResult<Response> {
        if let Some(cached) = self.content.get(&route.key).await? {
            debug!("Cache hit: {}", route.path);
            return Ok(cached);
        }

        debug!("Cache miss: {}", route.path);
        let response = self.fetcher.fetch(&FetchRequest::new(&route.url)).await?;
        if response.is_ok() {
            self.store_copy(route, &response).await;
        }
        Ok(response)
    }

    async fn online_first(&self, route: &Route) -> AssetSyncResult<Response> {
        match self.fetcher.fetch(&FetchRequest::new(&route.url)).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store_copy(route, &response).await;
                }
                Ok(response)
            }
            Err(network_err) => {
                debug!("Network failed for {}, trying cache", route.path);
                match self.content.get(&route.key).await {
                    Ok(Some(cached)) => Ok(cached),
                    Ok(None) => Err(network_err),
                    Err(e) => {
                        warn!("Cache lookup for {} failed: {}", route.path, e);
                        Err(network_err)
                    }
                }
            }
        }
    }

    /// Cache writes never fail the response being served
    async fn store_copy(&self, route: &Route, response: &Response) {
        if let Err(e) = self.content.put(&route.key, response).await {
            warn!("Failed to cache {}: {}", route.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetSyncError;
    use crate::network::testing::ScriptedFetcher;
    use crate::store::MemoryStore;

    const ORIGIN: &str = "https://app.test";

    struct Fixture {
        router: RequestRouter,
        fetcher: Arc<ScriptedFetcher>,
        content: Arc<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let manifest = ResourceManifest::from_entries([
            ("/", "r1"),
            ("index.html", "r1"),
            ("main.js", "m1"),
            ("assets/logo.png", "l1"),
        ]);
        let fetcher = Arc::new(ScriptedFetcher::new());
        let content = Arc::new(MemoryStore::new("content"));
        let router = RequestRouter::new(
            Origin::new(ORIGIN).unwrap(),
            Arc::new(manifest),
            fetcher.clone(),
            content.clone(),
        );
        Fixture {
            router,
            fetcher,
            content,
        }
    }

    #[test]
    fn non_get_passes_through() {
        let f = fixture();
        let request = Request::new(Method::Post, "https://app.test/main.js");
        assert!(f.router.route(&request).is_none());
    }

    #[tokio::test]
    async fn unlisted_path_passes_through_even_when_cached() {
        let f = fixture();
        f.content
            .put("https://app.test/api/data", &Response::new(200, "cached"))
            .await
            .unwrap();

        assert!(f
            .router
            .handle(&Request::get("https://app.test/api/data"))
            .await
            .is_none());
        assert!(f
            .router
            .route(&Request::get("https://cdn.test/main.js"))
            .is_none());
        assert_eq!(f.fetcher.request_count(), 0);
    }

    #[test]
    fn root_variants_route_online_first() {
        let f = fixture();
        for url in ["https://app.test", "https://app.test/", "https://app.test/#/home"] {
            let route = f.router.route(&Request::get(url)).unwrap();
            assert_eq!(route.policy, RoutePolicy::OnlineFirst, "{}", url);
            assert_eq!(route.key, "https://app.test/");
            assert_eq!(route.url, "https://app.test/");
        }
    }

    #[test]
    fn cache_buster_shares_key() {
        let f = fixture();
        let busted = f
            .router
            .route(&Request::get("https://app.test/index.html?v=123"))
            .unwrap();
        let plain = f
            .router
            .route(&Request::get("https://app.test/index.html"))
            .unwrap();

        assert_eq!(busted.path, plain.path);
        assert_eq!(busted.key, plain.key);
        assert_eq!(busted.policy, RoutePolicy::CacheFirst);
        assert_eq!(busted.url, "https://app.test/index.html?v=123");
    }

    #[tokio::test]
    async fn cache_first_fetches_once() {
        let f = fixture();
        f.fetcher.serve("https://app.test/main.js", "console.log(1)");
        let request = Request::get("https://app.test/main.js");

        let first = f.router.handle(&request).await.unwrap().unwrap();
        let second = f.router.handle(&request).await.unwrap().unwrap();

        assert_eq!(first.body, second.body);
        assert_eq!(f.fetcher.request_count(), 1);
        assert_eq!(f.content.len().await, 1);
    }

    #[tokio::test]
    async fn cache_buster_hits_populated_entry() {
        let f = fixture();
        f.fetcher.serve("https://app.test/index.html", "<html>");

        f.router
            .handle(&Request::get("https://app.test/index.html"))
            .await
            .unwrap()
            .unwrap();
        let busted = f
            .router
            .handle(&Request::get("https://app.test/index.html?v=9"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(busted.body, b"<html>");
        assert_eq!(f.fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn error_status_is_returned_but_not_cached() {
        let f = fixture();
        f.fetcher
            .respond("https://app.test/main.js", Response::new(500, "oops"));

        let response = f
            .router
            .handle(&Request::get("https://app.test/main.js"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.status, 500);
        assert!(f.content.is_empty().await);
    }

    #[tokio::test]
    async fn cache_miss_offline_propagates_error() {
        let f = fixture();
        f.fetcher.set_offline(true);

        let err = f
            .router
            .handle(&Request::get("https://app.test/assets/logo.png"))
            .await
            .unwrap()
            .unwrap_err();

        assert!(matches!(err, AssetSyncError::Fetch { .. }));
        assert!(f.content.is_empty().await);
    }

    #[tokio::test]
    async fn online_first_refreshes_cache() {
        let f = fixture();
        f.content
            .put("https://app.test/", &Response::new(200, "old root"))
            .await
            .unwrap();
        f.fetcher.serve("https://app.test/", "new root");

        let response = f
            .router
            .handle(&Request::get("https://app.test/"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.body, b"new root");
        assert_eq!(
            f.content.get("https://app.test/").await.unwrap().unwrap().body,
            b"new root"
        );
    }

    #[tokio::test]
    async fn online_first_falls_back_to_cache() {
        let f = fixture();
        f.content
            .put("https://app.test/", &Response::new(200, "cached root"))
            .await
            .unwrap();
        f.fetcher.set_offline(true);

        let response = f
            .router
            .handle(&Request::get("https://app.test"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.body, b"cached root");
    }

    #[tokio::test]
    async fn online_first_without_cache_returns_network_error() {
        let f = fixture();
        f.fetcher.set_offline(true);

        let err = f
            .router
            .handle(&Request::get("https://app.test/"))
            .await
            .unwrap()
            .unwrap_err();

        match err {
            AssetSyncError::Fetch { url, reason } => {
                assert_eq!(url, "https://app.test/");
                assert_eq!(reason, "network unreachable");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
