//! Install command - stage the shell of the current bundle

use super::{create_progress_bar, WorkerContext};
use crate::audit::events;
use crate::config::Config;
use crate::error::AssetSyncResult;
use console::style;
use serde_json::json;

/// Execute the install command
pub async fn execute(config: &Config) -> AssetSyncResult<()> {
    let ctx = WorkerContext::open(config).await?;
    let shell = ctx.worker.bundle().shell.len();

    let spinner = create_progress_bar(&format!("Staging {} shell resource(s)...", shell));
    let result = ctx.worker.on_install().await;
    spinner.finish_and_clear();

    match result {
        Ok(staged) => {
            ctx.audit
                .log(events::INSTALLED, ctx.origin(), json!({ "staged": staged }))
                .await;
            println!(
                "{} Staged {} shell resource(s) from {}",
                style("✓").green(),
                staged,
                ctx.origin()
            );
            println!("  Run {} to switch over", style("assetsync activate").cyan());
            Ok(())
        }
        Err(e) => {
            ctx.audit
                .log(
                    events::INSTALL_FAILED,
                    ctx.origin(),
                    json!({ "error": e.to_string() }),
                )
                .await;
            Err(e)
        }
    }
}
