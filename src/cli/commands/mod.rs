//! CLI command implementations

pub mod activate;
pub mod config;
pub mod get;
pub mod install;
pub mod manifest;
pub mod message;
pub mod offline;
pub mod status;

pub use activate::execute as activate;
pub use config::execute as config;
pub use get::execute as get;
pub use install::execute as install;
pub use manifest::execute as manifest;
pub use message::execute as message;
pub use offline::execute as offline;
pub use status::execute as status;

use crate::audit::AuditLog;
use crate::config::{Config, ConfigManager};
use crate::error::{AssetSyncError, AssetSyncResult};
use crate::lifecycle::{Host, ServiceWorker};
use crate::manifest::Bundle;
use crate::network::HttpFetcher;
use crate::resource::Origin;
use crate::store::CacheSet;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Host signals have no running clients to act on from the CLI; they are
/// reported so the operator can reload open pages.
pub struct CliHost;

impl Host for CliHost {
    fn skip_waiting(&self) {
        info!("New version will activate without waiting");
    }

    fn claim_clients(&self) {
        println!(
            "{} Open clients can now be served by this version",
            style("→").cyan()
        );
    }
}

/// A worker wired to disk stores and the network, plus the audit log
pub struct WorkerContext {
    pub worker: ServiceWorker,
    pub fetcher: Arc<HttpFetcher>,
    pub audit: AuditLog,
}

impl WorkerContext {
    /// Build the worker described by `config`
    pub async fn open(config: &Config) -> AssetSyncResult<Self> {
        ConfigManager::ensure_state_dirs().await?;

        let origin = Origin::new(
            config
                .origin
                .url
                .as_deref()
                .ok_or(AssetSyncError::OriginMissing)?,
        )?;
        let bundle = Bundle::load(&config.bundle.path).await?;

        let root = config
            .store
            .dir
            .clone()
            .unwrap_or_else(ConfigManager::caches_dir);
        let caches = CacheSet::on_disk(
            &root,
            &config.store.content,
            &config.store.staging,
            &config.store.manifest,
        );

        let fetcher = Arc::new(HttpFetcher::new(
            Duration::from_secs(config.network.timeout_secs),
            config.network.max_body_bytes,
        ));

        let worker = ServiceWorker::new(
            origin,
            bundle,
            caches,
            fetcher.clone(),
            Arc::new(CliHost),
        )
        .with_concurrency(config.network.concurrency);

        Ok(Self {
            worker,
            fetcher,
            audit: AuditLog::new(config),
        })
    }

    pub fn origin(&self) -> &str {
        self.worker.origin().as_str()
    }
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
