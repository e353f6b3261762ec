//! Error types for assetsync
//!
//! All modules use `AssetSyncResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for assetsync operations
pub type AssetSyncResult<T> = Result<T, AssetSyncError>;

/// All errors that can occur in assetsync
#[derive(Error, Debug)]
pub enum AssetSyncError {
    // Lifecycle errors
    #[error("Shell install failed for {path}: {reason}")]
    Install { path: String, reason: String },

    #[error("Cache reconciliation failed, all caches were reset: {reason}")]
    Reconcile { reason: String },

    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Offline download failed ({failed} resource(s) unavailable): {reason}")]
    OfflineFetch { failed: usize, reason: String },

    // Store errors
    #[error("Cache store {cache} failed: {reason}")]
    Store { cache: String, reason: String },

    #[error("Corrupt cache record in {cache}: {reason}")]
    CorruptRecord { cache: String, reason: String },

    // Manifest errors
    #[error("Invalid resource manifest: {0}")]
    ManifestInvalid(String),

    #[error("Bundle file not found: {0}")]
    BundleNotFound(PathBuf),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Origin not configured")]
    OriginMissing,

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl AssetSyncError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a store error for a named cache
    pub fn store(cache: impl Into<String>, reason: impl ToString) -> Self {
        Self::Store {
            cache: cache.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a network fetch error
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if re-triggering the lifecycle event may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Install { .. } | Self::Fetch { .. } | Self::OfflineFetch { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Install { .. } => Some("Check connectivity to the origin, then run: assetsync install"),
            Self::Reconcile { .. } => {
                Some("Caches were wiped. Run: assetsync install && assetsync activate")
            }
            Self::OfflineFetch { .. } => Some("Retry with: assetsync offline"),
            Self::OriginMissing => Some("Set [origin] url in config, or pass --origin"),
            Self::BundleNotFound(_) => Some("Point [bundle] path at the deployed bundle JSON"),
            _ => None,
        }
    }
}
