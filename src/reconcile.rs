//! Activation-time reconciliation of the content cache
//!
//! Moves the content cache from the previously installed manifest to the
//! new one:
//!
//! | Prior record | Action |
//! |--------------|--------|
//! | absent | Drop the content cache, promote staged shell |
//! | present | Evict changed/removed paths, keep unchanged, promote staged shell |
//! | any error | Delete content, staging and manifest stores |
//!
//! Eviction always finishes before promotion starts, so a staged shell
//! response replaces any same-keyed entry that survived eviction.

use crate::error::{AssetSyncError, AssetSyncResult};
use crate::manifest::{ResourceManifest, ShellSet, MANIFEST_RECORD_KEY};
use crate::resource::Origin;
use crate::store::CacheSet;
use tracing::{debug, error, info, warn};

/// Which reconciliation path ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationKind {
    /// No prior manifest record existed
    FirstInstall,
    /// A prior manifest record was diffed against the new manifest
    Upgrade,
}

/// Summary of a successful reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub kind: ActivationKind,

    /// Content keys deleted because their fingerprint changed or vanished
    pub evicted: Vec<String>,

    /// Content entries reused from the previous version
    pub retained: usize,

    /// Staged shell entries copied into the content cache
    pub promoted: usize,

    /// Stored keys from another origin that were left untouched
    pub skipped: Vec<String>,
}

/// Runs once per version transition. Callers must not run two
/// reconciliations over the same [`CacheSet`] concurrently.
pub struct ManifestReconciler {
    origin: Origin,
    caches: CacheSet,
}

impl ManifestReconciler {
    pub fn new(origin: Origin, caches: CacheSet) -> Self {
        Self { origin, caches }
    }

    /// Reconcile the caches against `manifest`.
    ///
    /// Any failure wipes all three stores before returning
    /// [`AssetSyncError::Reconcile`], so the next install starts from a
    /// first-install state.
    pub async fn reconcile(
        &self,
        manifest: &ResourceManifest,
        shell: &ShellSet,
    ) -> AssetSyncResult<Activation> {
        match self.migrate(manifest, shell).await {
            Ok(activation) => Ok(activation),
            Err(e) => {
                error!("Failed to reconcile caches: {}", e);
                if let Err(wipe_err) = self.caches.wipe().await {
                    warn!("Cache reset after failed reconcile was incomplete: {}", wipe_err);
                }
                Err(AssetSyncError::Reconcile {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn migrate(
        &self,
        manifest: &ResourceManifest,
        shell: &ShellSet,
    ) -> AssetSyncResult<Activation> {
        self.check_staged(shell).await?;

        let previous = match self.caches.manifest.get(MANIFEST_RECORD_KEY).await? {
            Some(record) => Some(ResourceManifest::from_record(&record)?),
            None => None,
        };

        let mut activation = match previous {
            None => {
                info!("No installed manifest, rebuilding content cache");
                self.caches.content.clear().await?;
                Activation {
                    kind: ActivationKind::FirstInstall,
                    evicted: vec![],
                    retained: 0,
                    promoted: 0,
                    skipped: vec![],
                }
            }
            Some(old) => self.evict_stale(&old, manifest).await?,
        };

        activation.promoted = self.promote_staged(shell).await?;
        self.caches.staging.clear().await?;
        self.write_record(manifest).await?;

        info!(
            "Activated {:?}: {} evicted, {} retained, {} promoted",
            activation.kind,
            activation.evicted.len(),
            activation.retained,
            activation.promoted
        );
        Ok(activation)
    }

    /// Every shell path must have been staged by a completed install
    async fn check_staged(&self, shell: &ShellSet) -> AssetSyncResult<()> {
        let staged = self.caches.staging.keys().await?;
        for path in shell.iter() {
            let key = self.origin.url_for(path);
            if !staged.contains(&key) {
                return Err(AssetSyncError::store(
                    self.caches.staging.name(),
                    format!("shell resource '{}' was not staged", path),
                ));
            }
        }
        Ok(())
    }

    async fn evict_stale(
        &self,
        old: &ResourceManifest,
        new: &ResourceManifest,
    ) -> AssetSyncResult<Activation> {
        let mut evicted = vec![];
        let mut skipped = vec![];
        let mut retained = 0;

        for key in self.caches.content.keys().await? {
            let Some(path) = self.origin.path_of(&key) else {
                warn!("Skipping cached key outside origin {}: {}", self.origin, key);
                skipped.push(key);
                continue;
            };

            let current = new.fingerprint(&path);
            if current.is_none() || current != old.fingerprint(&path) {
                debug!("Evicting {} ({:?} -> {:?})", path, old.fingerprint(&path), current);
                self.caches.content.delete(&key).await?;
                evicted.push(key);
            } else {
                retained += 1;
            }
        }

        Ok(Activation {
            kind: ActivationKind::Upgrade,
            evicted,
            retained,
            promoted: 0,
            skipped,
        })
    }

    /// Copy the staged shell into the content cache. Staged keys outside
    /// the current shell are left behind and dropped with the staging store.
    async fn promote_staged(&self, shell: &ShellSet) -> AssetSyncResult<usize> {
        let mut promoted = 0;
        for path in shell.iter() {
            let key = self.origin.url_for(path);
            let response = self.caches.staging.get(&key).await?.ok_or_else(|| {
                AssetSyncError::store(
                    self.caches.staging.name(),
                    format!("staged entry vanished: {}", key),
                )
            })?;
            self.caches.content.put(&key, &response).await?;
            promoted += 1;
        }
        Ok(promoted)
    }

    async fn write_record(&self, manifest: &ResourceManifest) -> AssetSyncResult<()> {
        self.caches.manifest.clear().await?;
        self.caches
            .manifest
            .put(MANIFEST_RECORD_KEY, &manifest.to_record()?)
            .await
    }
}
