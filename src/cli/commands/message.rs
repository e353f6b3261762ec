//! Message command - deliver a message to the worker

use super::WorkerContext;
use crate::audit::events;
use crate::cli::args::MessageArgs;
use crate::config::Config;
use crate::error::AssetSyncResult;
use crate::lifecycle::CommandOutcome;
use console::style;
use serde_json::json;

/// Execute the message command
pub async fn execute(args: MessageArgs, config: &Config) -> AssetSyncResult<()> {
    let ctx = WorkerContext::open(config).await?;

    match ctx.worker.on_command(&args.message).await? {
        CommandOutcome::SkippedWaiting => {
            println!("{} Skipped waiting", style("✓").green());
        }
        CommandOutcome::Downloaded(added) => {
            ctx.audit
                .log(
                    events::OFFLINE_DOWNLOADED,
                    ctx.origin(),
                    json!({ "added": added }),
                )
                .await;
            println!("{} Downloaded {} resource(s)", style("✓").green(), added);
        }
        CommandOutcome::Ignored => {
            println!(
                "{} Ignored unknown message: {}",
                style("→").cyan(),
                args.message
            );
        }
    }

    Ok(())
}
