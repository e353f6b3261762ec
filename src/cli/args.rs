//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// assetsync - Offline-first asset cache synchronizer
///
/// Installs, reconciles and serves a versioned cache of a web
/// application's static assets.
#[derive(Parser, Debug)]
#[command(name = "assetsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ASSETSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .assetsync.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// Origin serving the bundle (overrides [origin] url)
    #[arg(long, global = true, env = "ASSETSYNC_ORIGIN")]
    pub origin: Option<String>,

    /// Bundle JSON path (overrides [bundle] path)
    #[arg(short, long, global = true, env = "ASSETSYNC_BUNDLE")]
    pub bundle: Option<PathBuf>,

    /// Cache store root directory (overrides [store] dir)
    #[arg(long, global = true, env = "ASSETSYNC_STORE")]
    pub store: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stage the shell resources of the current bundle
    Install,

    /// Reconcile caches against the current bundle
    Activate,

    /// Route a request through the cache
    Get(GetArgs),

    /// Download every bundle resource for offline use
    Offline,

    /// Send a message to the worker (skipWaiting, downloadOffline)
    Message(MessageArgs),

    /// Show cache state for the current bundle
    Status(StatusArgs),

    /// Generate a bundle by fingerprinting a build directory
    Manifest(ManifestArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Absolute request URL
    pub url: String,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Write the response body to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the message command
#[derive(Parser, Debug)]
pub struct MessageArgs {
    /// Message payload
    pub message: String,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the manifest command
#[derive(Parser, Debug)]
pub struct ManifestArgs {
    /// Build directory to fingerprint
    pub dir: PathBuf,

    /// Shell paths fetched at install time (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "index.html")]
    pub shell: Vec<String>,

    /// Write the bundle here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., origin.url)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for status command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one missing path per line)
    Plain,
}
