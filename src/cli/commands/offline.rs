//! Offline command - download every bundle resource

use super::{create_progress_bar, WorkerContext};
use crate::audit::events;
use crate::config::Config;
use crate::error::AssetSyncResult;
use crate::lifecycle::{Command, CommandOutcome};
use console::style;
use serde_json::json;

/// Execute the offline command
pub async fn execute(config: &Config) -> AssetSyncResult<()> {
    let ctx = WorkerContext::open(config).await?;
    let missing = ctx.worker.missing().await?;

    if missing.is_empty() {
        println!(
            "{} All {} resource(s) already available offline",
            style("✓").green(),
            ctx.worker.bundle().resources.len()
        );
        return Ok(());
    }

    let spinner = create_progress_bar(&format!("Downloading {} resource(s)...", missing.len()));
    let result = ctx.worker.on_command(Command::DownloadOffline.as_str()).await;
    spinner.finish_and_clear();

    if let CommandOutcome::Downloaded(added) = result? {
        ctx.audit
            .log(
                events::OFFLINE_DOWNLOADED,
                ctx.origin(),
                json!({ "added": added }),
            )
            .await;
        println!(
            "{} Downloaded {} resource(s) for offline use",
            style("✓").green(),
            added
        );
    }

    Ok(())
}
