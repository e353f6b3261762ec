//! Configuration schema for assetsync
//!
//! Configuration is stored at `~/.config/assetsync/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::store::names;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Origin the bundle is served from
    pub origin: OriginConfig,

    /// Deployed bundle location
    pub bundle: BundleConfig,

    /// Cache store settings
    pub store: StoreConfig,

    /// Network settings
    pub network: NetworkConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging of lifecycle events
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Origin settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Scheme and host, e.g. `https://app.example.com`
    pub url: Option<String>,
}

/// Bundle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Path to the bundle JSON (`{"resources": {...}, "shell": [...]}`)
    pub path: PathBuf,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assetsync-bundle.json"),
        }
    }
}

/// Cache store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory for the stores (defaults to the state directory)
    pub dir: Option<PathBuf>,

    /// Name of the durable content cache
    pub content: String,

    /// Name of the install-time staging cache
    pub staging: String,

    /// Name of the manifest record store
    pub manifest: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: None,
            content: names::CONTENT.to_string(),
            staging: names::STAGING.to_string(),
            manifest: names::MANIFEST.to_string(),
        }
    }
}

/// Network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Concurrent fetches during install and offline download
    pub concurrency: usize,

    /// Largest response body accepted, in bytes
    pub max_body_bytes: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            concurrency: 8,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[store]"));
        assert!(toml.contains("[network]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.store.content, "assetsync-content");
        assert!(config.origin.url.is_none());
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [origin]
            url = "https://app.example.com"

            [network]
            concurrency = 2
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.origin.url.as_deref(), Some("https://app.example.com"));
        assert_eq!(config.network.concurrency, 2);
        assert_eq!(config.network.timeout_secs, 30); // default preserved
    }
}
