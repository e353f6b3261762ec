//! Activate command - reconcile caches against the current bundle

use super::WorkerContext;
use crate::audit::events;
use crate::config::Config;
use crate::error::AssetSyncResult;
use crate::reconcile::ActivationKind;
use console::style;
use serde_json::json;

/// Execute the activate command
pub async fn execute(config: &Config) -> AssetSyncResult<()> {
    let ctx = WorkerContext::open(config).await?;

    let activation = match ctx.worker.on_activate().await {
        Ok(activation) => activation,
        Err(e) => {
            ctx.audit
                .log(events::RESET, ctx.origin(), json!({ "error": e.to_string() }))
                .await;
            return Err(e);
        }
    };

    let kind = match activation.kind {
        ActivationKind::FirstInstall => "first_install",
        ActivationKind::Upgrade => "upgrade",
    };
    ctx.audit
        .log(
            events::ACTIVATED,
            ctx.origin(),
            json!({
                "kind": kind,
                "evicted": activation.evicted.len(),
                "retained": activation.retained,
                "promoted": activation.promoted,
                "skipped": activation.skipped.len(),
            }),
        )
        .await;

    match activation.kind {
        ActivationKind::FirstInstall => {
            println!("{} Activated first install", style("✓").green());
        }
        ActivationKind::Upgrade => {
            println!(
                "{} Upgraded: {} evicted, {} retained",
                style("✓").green(),
                activation.evicted.len(),
                activation.retained
            );
        }
    }
    println!("  {} shell resource(s) promoted", activation.promoted);

    if !activation.skipped.is_empty() {
        println!(
            "  {} {} foreign entr(ies) left untouched",
            style("⚠").yellow(),
            activation.skipped.len()
        );
    }

    Ok(())
}
