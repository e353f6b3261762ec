//! Named cache stores
//!
//! Three independently addressable stores back the synchronizer:
//!
//! | Store | Lifetime | Purpose |
//! |-------|----------|---------|
//! | content | durable | Serves routed requests |
//! | staging | transient | Holds shell resources between install and activate |
//! | manifest | durable | Holds the manifest of the last successful activation |
//!
//! Stores are passed explicitly to every component so the lifecycle logic
//! runs unchanged against [`MemoryStore`] in tests and [`DiskStore`] in the CLI.

pub mod disk;
pub mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use crate::error::AssetSyncResult;
use crate::resource::Response;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Default store names
pub mod names {
    /// Durable content cache
    pub const CONTENT: &str = "assetsync-content";
    /// Transient install-time staging cache
    pub const STAGING: &str = "assetsync-staging";
    /// Manifest record store
    pub const MANIFEST: &str = "assetsync-manifest";
}

/// Key-value store of request key to cached response
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Name of this store
    fn name(&self) -> &str;

    /// Look up a cached response
    async fn get(&self, key: &str) -> AssetSyncResult<Option<Response>>;

    /// Store a response, replacing any existing entry
    async fn put(&self, key: &str, response: &Response) -> AssetSyncResult<()>;

    /// Delete an entry, returning whether it existed
    async fn delete(&self, key: &str) -> AssetSyncResult<bool>;

    /// Enumerate all keys
    async fn keys(&self) -> AssetSyncResult<Vec<String>>;

    /// Delete the whole store
    async fn clear(&self) -> AssetSyncResult<()>;
}

/// The three stores used by the synchronizer
#[derive(Clone)]
pub struct CacheSet {
    pub content: Arc<dyn CacheStore>,
    pub staging: Arc<dyn CacheStore>,
    pub manifest: Arc<dyn CacheStore>,
}

impl CacheSet {
    pub fn new(
        content: Arc<dyn CacheStore>,
        staging: Arc<dyn CacheStore>,
        manifest: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            content,
            staging,
            manifest,
        }
    }

    /// Fresh in-memory stores with the default names
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new(names::CONTENT)),
            Arc::new(MemoryStore::new(names::STAGING)),
            Arc::new(MemoryStore::new(names::MANIFEST)),
        )
    }

    /// Disk stores rooted at `root`, one directory per store
    pub fn on_disk(root: &Path, content: &str, staging: &str, manifest: &str) -> Self {
        Self::new(
            Arc::new(DiskStore::new(root, content)),
            Arc::new(DiskStore::new(root, staging)),
            Arc::new(DiskStore::new(root, manifest)),
        )
    }

    /// Delete all three stores.
    ///
    /// Every store is attempted; the first failure is returned.
    pub async fn wipe(&self) -> AssetSyncResult<()> {
        let mut first_err = None;
        for store in [&self.content, &self.staging, &self.manifest] {
            if let Err(e) = store.clear().await {
                warn!("Failed to clear cache {}: {}", store.name(), e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
