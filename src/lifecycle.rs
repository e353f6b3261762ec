//! Worker lifecycle: install, activate, request and command events
//!
//! [`ServiceWorker`] owns one deployed [`Bundle`] and the caches it manages.
//! A host adapter translates platform events into the four `on_*` calls and
//! implements [`Host`] for the two control signals the worker emits.

use crate::error::AssetSyncResult;
use crate::installer::ShellInstaller;
use crate::manifest::Bundle;
use crate::network::Fetcher;
use crate::offline::OfflineBulkFetcher;
use crate::reconcile::{Activation, ManifestReconciler};
use crate::resource::{Origin, Request, Response};
use crate::router::RequestRouter;
use crate::store::CacheSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Default number of concurrent network fetches for bulk operations
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Control signals the worker sends to its host
pub trait Host: Send + Sync {
    /// Activate this version without waiting for older clients to close
    fn skip_waiting(&self);

    /// Take control of every open client immediately
    fn claim_clients(&self);
}

/// Out-of-band commands accepted on the message channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Take over immediately
    SkipWaiting,
    /// Fetch every resource for offline use
    DownloadOffline,
}

impl Command {
    /// Parse a message; anything unrecognised yields `None`
    pub fn parse(message: &str) -> Option<Self> {
        match message {
            "skipWaiting" => Some(Self::SkipWaiting),
            "downloadOffline" => Some(Self::DownloadOffline),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkipWaiting => "skipWaiting",
            Self::DownloadOffline => "downloadOffline",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of handling a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    SkippedWaiting,
    Downloaded(usize),
    Ignored,
}

/// State-holding lifecycle component for one deployed version
pub struct ServiceWorker {
    origin: Origin,
    bundle: Arc<Bundle>,
    caches: CacheSet,
    fetcher: Arc<dyn Fetcher>,
    host: Arc<dyn Host>,
    router: RequestRouter,
    concurrency: usize,
    activation_lock: Mutex<()>,
}

impl ServiceWorker {
    pub fn new(
        origin: Origin,
        bundle: Bundle,
        caches: CacheSet,
        fetcher: Arc<dyn Fetcher>,
        host: Arc<dyn Host>,
    ) -> Self {
        let bundle = Arc::new(bundle);
        let router = RequestRouter::new(
            origin.clone(),
            Arc::new(bundle.resources.clone()),
            fetcher.clone(),
            caches.content.clone(),
        );

        Self {
            origin,
            bundle,
            caches,
            fetcher,
            host,
            router,
            concurrency: DEFAULT_CONCURRENCY,
            activation_lock: Mutex::new(()),
        }
    }

    /// Limit concurrent fetches during install and offline download
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn caches(&self) -> &CacheSet {
        &self.caches
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn router(&self) -> &RequestRouter {
        &self.router
    }

    /// Install event: stage the shell. The new version asks to skip waiting.
    pub async fn on_install(&self) -> AssetSyncResult<usize> {
        self.host.skip_waiting();
        ShellInstaller::new(
            self.origin.clone(),
            self.fetcher.clone(),
            self.caches.staging.clone(),
            self.concurrency,
        )
        .install(&self.bundle.shell)
        .await
    }

    /// Activate event: reconcile caches, then claim clients on success
    pub async fn on_activate(&self) -> AssetSyncResult<Activation> {
        let _guard = self.activation_lock.lock().await;

        let activation = ManifestReconciler::new(self.origin.clone(), self.caches.clone())
            .reconcile(&self.bundle.resources, &self.bundle.shell)
            .await?;

        self.host.claim_clients();
        Ok(activation)
    }

    /// Request event. `None` means the host should handle it itself.
    pub async fn on_request(&self, request: &Request) -> Option<AssetSyncResult<Response>> {
        self.router.handle(request).await
    }

    /// Message event. Unknown messages are ignored.
    pub async fn on_command(&self, message: &str) -> AssetSyncResult<CommandOutcome> {
        match Command::parse(message) {
            Some(Command::SkipWaiting) => {
                info!("Skipping wait on request");
                self.host.skip_waiting();
                Ok(CommandOutcome::SkippedWaiting)
            }
            Some(Command::DownloadOffline) => {
                let added = self.offline_fetcher().download_all(&self.bundle.resources).await?;
                Ok(CommandOutcome::Downloaded(added))
            }
            None => {
                debug!("Ignoring unknown message: {}", message);
                Ok(CommandOutcome::Ignored)
            }
        }
    }

    /// Manifest paths not yet in the content cache
    pub async fn missing(&self) -> AssetSyncResult<Vec<String>> {
        self.offline_fetcher().missing(&self.bundle.resources).await
    }

    fn offline_fetcher(&self) -> OfflineBulkFetcher {
        OfflineBulkFetcher::new(
            self.origin.clone(),
            self.fetcher.clone(),
            self.caches.content.clone(),
            self.concurrency,
        )
    }
}
