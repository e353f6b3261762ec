//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{AssetSyncError, AssetSyncResult};
use console::style;
use std::path::PathBuf;

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
) -> AssetSyncResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> AssetSyncResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> AssetSyncResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        println!(
            "{} Config already exists at {}",
            style("⚠").yellow(),
            path.display()
        );
        println!("  Use --force to overwrite");
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Configuration initialized: {}",
        style("✓").green(),
        path.display()
    );

    Ok(())
}

async fn set_value(manager: &ConfigManager, key: &str, value: &str) -> AssetSyncResult<()> {
    // Edit the file on disk, not the merged view with CLI overrides applied
    let mut config = manager.load().await?;

    if let Err(e) = apply(&mut config, key, value) {
        if matches!(e, AssetSyncError::User(ref msg) if msg.starts_with("Unknown config key")) {
            eprintln!("Valid keys:");
            print_valid_keys();
        }
        return Err(e);
    }

    manager.save(&config).await?;
    println!("{} Set {} = {}", style("✓").green(), key, value);

    Ok(())
}

/// Assign a dot-separated key on `config`
fn apply(config: &mut Config, key: &str, value: &str) -> AssetSyncResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(value)?,
        ["general", "log_format"] => config.general.log_format = parse_log_format(value)?,
        ["general", "audit_log"] => config.general.audit_log = parse_bool(value)?,

        ["origin", "url"] => config.origin.url = Some(value.to_string()),

        ["bundle", "path"] => config.bundle.path = PathBuf::from(value),

        ["store", "dir"] => config.store.dir = Some(PathBuf::from(value)),
        ["store", "content"] => config.store.content = value.to_string(),
        ["store", "staging"] => config.store.staging = value.to_string(),
        ["store", "manifest"] => config.store.manifest = value.to_string(),

        ["network", "timeout_secs"] => config.network.timeout_secs = parse_u64(value)?,
        ["network", "concurrency"] => config.network.concurrency = parse_u64(value)? as usize,
        ["network", "max_body_bytes"] => config.network.max_body_bytes = parse_u64(value)?,

        _ => {
            return Err(AssetSyncError::User(format!(
                "Unknown config key: {}",
                key
            )))
        }
    }

    Ok(())
}

fn parse_bool(value: &str) -> AssetSyncResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AssetSyncError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> AssetSyncResult<u64> {
    value
        .parse()
        .map_err(|_| AssetSyncError::User(format!("Invalid number: {}", value)))
}

fn parse_log_format(value: &str) -> AssetSyncResult<String> {
    match value {
        "text" | "json" => Ok(value.to_string()),
        _ => Err(AssetSyncError::User(format!(
            "Invalid log format: {}. Use text or json",
            value
        ))),
    }
}

fn print_valid_keys() {
    let keys = [
        "general.verbose",
        "general.log_format",
        "general.audit_log",
        "origin.url",
        "bundle.path",
        "store.dir",
        "store.content",
        "store.staging",
        "store.manifest",
        "network.timeout_secs",
        "network.concurrency",
        "network.max_body_bytes",
    ];

    for key in keys {
        eprintln!("  {}", key);
    }
}
