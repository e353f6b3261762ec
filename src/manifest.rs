//! Resource manifest, shell set and deployment bundle
//!
//! A manifest maps each logical resource path to an opaque fingerprint.
//! Fingerprints are only ever compared for byte equality.

use crate::error::{AssetSyncError, AssetSyncResult};
use crate::resource::{Response, ROOT_PATH};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Key of the single record held by the manifest-record store
pub const MANIFEST_RECORD_KEY: &str = "manifest";

/// Document served at the root path when generating a manifest
const ROOT_DOCUMENT: &str = "index.html";

/// Immutable mapping of resource path to content fingerprint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest {
    entries: BTreeMap<String, String>,
}

impl ResourceManifest {
    /// Build a manifest from `(path, fingerprint)` pairs
    pub fn from_entries<I, P, F>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, F)>,
        P: Into<String>,
        F: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(p, f)| (p.into(), f.into()))
                .collect(),
        }
    }

    /// Fingerprint recorded for a path
    pub fn fingerprint(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// All paths in lexical order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, f)| (p.as_str(), f.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode as the payload of the persisted manifest record
    pub fn to_record(&self) -> AssetSyncResult<Response> {
        let body = serde_json::to_vec(self)?;
        Ok(Response::new(200, body).with_header("content-type", "application/json"))
    }

    /// Decode a persisted manifest record
    pub fn from_record(record: &Response) -> AssetSyncResult<Self> {
        serde_json::from_slice(&record.body).map_err(|e| {
            AssetSyncError::ManifestInvalid(format!("stored manifest record is unreadable: {}", e))
        })
    }

    /// Generate a manifest by fingerprinting every file under `dir`.
    ///
    /// Paths use `/` separators relative to `dir`. When an `index.html`
    /// exists at the top level it is also published under the root path.
    pub fn from_dir(dir: &Path) -> AssetSyncResult<Self> {
        let mut entries = BTreeMap::new();
        collect_fingerprints(dir, dir, &mut entries)?;

        if let Some(fingerprint) = entries.get(ROOT_DOCUMENT).cloned() {
            entries.insert(ROOT_PATH.to_string(), fingerprint);
        }

        debug!("Fingerprinted {} resources under {}", entries.len(), dir.display());
        Ok(Self { entries })
    }
}

fn collect_fingerprints(
    root: &Path,
    dir: &Path,
    entries: &mut BTreeMap<String, String>,
) -> AssetSyncResult<()> {
    let read_dir = fs::read_dir(dir)
        .map_err(|e| AssetSyncError::io(format!("reading directory {}", dir.display()), e))?;

    for entry in read_dir {
        let entry = entry.map_err(|e| AssetSyncError::io("reading directory entry", e))?;
        let path = entry.path();

        if path.is_dir() {
            collect_fingerprints(root, &path, entries)?;
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .map_err(|e| AssetSyncError::Internal(e.to_string()))?;
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let content = fs::read(&path)
            .map_err(|e| AssetSyncError::io(format!("reading {}", path.display()), e))?;
        entries.insert(key, fingerprint(&content));
    }

    Ok(())
}

/// Content fingerprint: first 16 bytes of the SHA256 digest, hex encoded
pub fn fingerprint(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    hex::encode(&digest[..16])
}

/// Ordered set of paths that must be fetched before the app can boot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShellSet(Vec<String>);

impl ShellSet {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self(paths.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.iter().any(|p| p == path)
    }
}

/// A deployed version: the manifest plus its shell set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// Every resource managed by the cache, with its fingerprint
    pub resources: ResourceManifest,

    /// Resources fetched at install time
    #[serde(default)]
    pub shell: ShellSet,
}

impl Bundle {
    pub fn new(resources: ResourceManifest, shell: ShellSet) -> AssetSyncResult<Self> {
        let bundle = Self { resources, shell };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Every shell path must be a manifest key
    pub fn validate(&self) -> AssetSyncResult<()> {
        if let Some(stray) = self.shell.iter().find(|p| !self.resources.contains(p)) {
            return Err(AssetSyncError::ManifestInvalid(format!(
                "shell path '{}' is not listed in resources",
                stray
            )));
        }
        Ok(())
    }

    /// Load and validate a bundle JSON file
    pub async fn load(path: &Path) -> AssetSyncResult<Self> {
        if !path.exists() {
            return Err(AssetSyncError::BundleNotFound(path.to_path_buf()));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AssetSyncError::io(format!("reading bundle {}", path.display()), e))?;

        let bundle: Bundle = serde_json::from_str(&content).map_err(|e| {
            AssetSyncError::ManifestInvalid(format!("{}: {}", path.display(), e))
        })?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Write the bundle as pretty JSON
    pub async fn save(&self, path: &Path) -> AssetSyncResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| AssetSyncError::io(format!("writing bundle {}", path.display()), e))
    }
}
