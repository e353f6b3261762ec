//! assetsync - Offline-first asset cache synchronizer
//!
//! CLI entry point that dispatches to subcommands.

use assetsync::cli::{commands, Cli, Commands};
use assetsync::config::{Config, ConfigManager};
use assetsync::error::{AssetSyncError, AssetSyncResult};
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            } else if e.is_retryable() {
                eprintln!("{} Retry once the origin is reachable", style("Hint:").yellow());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> AssetSyncResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| AssetSyncError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let mut config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;
    apply_overrides(&mut config, &cli);

    let verbose = if config.general.verbose {
        cli.verbose.max(1)
    } else {
        cli.verbose
    };
    init_logging(verbose, config.general.log_format == "json");

    if let Some(ref path) = local_config_path {
        debug!("Merged local config: {}", path.display());
    }

    match cli.command {
        Commands::Install => commands::install(&config).await,
        Commands::Activate => commands::activate(&config).await,
        Commands::Get(args) => commands::get(args, &config).await,
        Commands::Offline => commands::offline(&config).await,
        Commands::Message(args) => commands::message(args, &config).await,
        Commands::Status(args) => commands::status(args, &config).await,
        Commands::Manifest(args) => commands::manifest(args).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

/// Initialize logging: 0 = warn (spinners only), 1 = info, 2+ = debug
fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("assetsync=warn"),
        1 => EnvFilter::new("assetsync=info"),
        _ => EnvFilter::new("assetsync=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

/// Command-line flags win over every config file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref origin) = cli.origin {
        config.origin.url = Some(origin.clone());
    }
    if let Some(ref bundle) = cli.bundle {
        config.bundle.path = bundle.clone();
    }
    if let Some(ref store) = cli.store {
        config.store.dir = Some(store.clone());
    }
}
