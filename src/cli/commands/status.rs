//! Status command - show cache state for the current bundle

use super::WorkerContext;
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::AssetSyncResult;
use crate::manifest::{ResourceManifest, MANIFEST_RECORD_KEY};
use console::{style, Emoji};
use serde::Serialize;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// How the stored manifest record relates to the current bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Installed {
    Current,
    Outdated,
    Absent,
    Unreadable,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    origin: String,
    bundle: String,
    resources: usize,
    shell: usize,
    installed: Installed,
    staged: usize,
    cached: usize,
    missing: Vec<String>,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> AssetSyncResult<()> {
    let ctx = WorkerContext::open(config).await?;
    let worker = &ctx.worker;
    let bundle = worker.bundle();

    let installed = match worker.caches().manifest.get(MANIFEST_RECORD_KEY).await {
        Ok(Some(record)) => match ResourceManifest::from_record(&record) {
            Ok(stored) if stored == bundle.resources => Installed::Current,
            Ok(_) => Installed::Outdated,
            Err(_) => Installed::Unreadable,
        },
        Ok(None) => Installed::Absent,
        Err(_) => Installed::Unreadable,
    };

    let report = StatusReport {
        origin: ctx.origin().to_string(),
        bundle: config.bundle.path.display().to_string(),
        resources: bundle.resources.len(),
        shell: bundle.shell.len(),
        installed,
        staged: worker.caches().staging.keys().await?.len(),
        cached: worker.caches().content.keys().await?.len(),
        missing: worker.missing().await?,
    };

    match args.format {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            for path in &report.missing {
                println!("{}", path);
            }
        }
    }

    Ok(())
}

fn print_table(report: &StatusReport) {
    println!("{}", style("assetsync Cache Status").bold().cyan());
    println!();

    println!("{}", style("Bundle:").bold());
    println!("  Origin:    {}", report.origin);
    println!("  File:      {}", report.bundle);
    println!(
        "  Resources: {} ({} in shell)",
        report.resources, report.shell
    );

    println!();
    println!("{}", style("Caches:").bold());
    match report.installed {
        Installed::Current => println!("  {} {}", CHECK, style("Active version is current").green()),
        Installed::Outdated => println!(
            "  {} {} - Run: assetsync install && assetsync activate",
            WARN,
            style("Active version differs from bundle").yellow()
        ),
        Installed::Absent => println!(
            "  {} {} - Run: assetsync install && assetsync activate",
            WARN,
            style("No version activated").yellow()
        ),
        Installed::Unreadable => println!(
            "  {} {} - Run: assetsync activate to reset",
            CROSS,
            style("Manifest record unreadable").red()
        ),
    }
    println!("  Staged:  {}", report.staged);
    println!("  Cached:  {}", report.cached);

    println!();
    if report.missing.is_empty() {
        println!("{}", style("All resources available offline").green().bold());
    } else {
        println!(
            "{}",
            style(format!(
                "{} resource(s) not cached - Run: assetsync offline",
                report.missing.len()
            ))
            .yellow()
            .bold()
        );
    }
}
