//! Filesystem-backed cache store
//!
//! # Layout
//!
//! ```text
//! {root}/{store-name}/
//!   {sha256(key)}.body   # Response payload
//!   {sha256(key)}.json   # Key, status, headers, stored_at
//! ```
//!
//! Both files are written to a `.tmp` sibling and renamed into place.
//! `put` removes the old metadata first, then writes the body, then the
//! metadata, so an interrupted write leaves the entry absent rather than
//! pairing old metadata with a new payload.

use crate::error::{AssetSyncError, AssetSyncResult};
use crate::resource::Response;
use crate::store::CacheStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Metadata persisted next to each payload
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordMeta {
    key: String,
    status: u16,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    stored_at: DateTime<Utc>,
}

/// Durable store keeping one directory per named cache
#[derive(Debug, Clone)]
pub struct DiskStore {
    name: String,
    dir: PathBuf,
}

impl DiskStore {
    /// Create a store named `name` under `root`. Nothing is created on disk
    /// until the first write.
    pub fn new(root: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            dir: root.join(&name),
            name,
        }
    }

    /// Directory holding this store's records
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_stem(key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::entry_stem(key)))
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.body", Self::entry_stem(key)))
    }

    fn io_err(&self, action: &str, path: &Path, e: std::io::Error) -> AssetSyncError {
        AssetSyncError::store(&self.name, format!("{} {}: {}", action, path.display(), e))
    }

    fn corrupt(&self, reason: impl Into<String>) -> AssetSyncError {
        AssetSyncError::CorruptRecord {
            cache: self.name.clone(),
            reason: reason.into(),
        }
    }

    async fn read_meta(&self, path: &Path) -> AssetSyncResult<Option<RecordMeta>> {
        let content = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err("reading", path, e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| self.corrupt(format!("{}: {}", path.display(), e)))
    }

    /// Write to `<path>.tmp`, then rename over `path`
    async fn write_atomic(&self, path: &Path, data: &[u8]) -> AssetSyncResult<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, data)
            .await
            .map_err(|e| self.io_err("writing", &tmp, e))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| self.io_err("renaming", &tmp, e))
    }

    async fn remove_if_exists(&self, path: &Path) -> AssetSyncResult<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_err("removing", path, e)),
        }
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> AssetSyncResult<Option<Response>> {
        let Some(meta) = self.read_meta(&self.meta_path(key)).await? else {
            return Ok(None);
        };

        if meta.key != key {
            return Err(self.corrupt(format!("record for '{}' holds key '{}'", key, meta.key)));
        }

        let body_path = self.body_path(key);
        let body = match fs::read(&body_path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(self.corrupt(format!("payload missing for '{}'", key)));
            }
            Err(e) => return Err(self.io_err("reading", &body_path, e)),
        };

        Ok(Some(Response {
            status: meta.status,
            headers: meta.headers,
            body,
        }))
    }

    async fn put(&self, key: &str, response: &Response) -> AssetSyncResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.io_err("creating", &self.dir, e))?;

        let meta_path = self.meta_path(key);
        self.remove_if_exists(&meta_path).await?;

        let body_path = self.body_path(key);
        self.write_atomic(&body_path, &response.body).await?;

        let meta = RecordMeta {
            key: key.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            stored_at: Utc::now(),
        };
        self.write_atomic(&meta_path, &serde_json::to_vec_pretty(&meta)?)
            .await?;

        debug!("Stored {} in {}", key, self.name);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AssetSyncResult<bool> {
        let existed = self.remove_if_exists(&self.meta_path(key)).await?;
        self.remove_if_exists(&self.body_path(key)).await?;
        Ok(existed)
    }

    async fn keys(&self) -> AssetSyncResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(self.io_err("listing", &self.dir, e)),
        };

        let mut keys = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| self.io_err("listing", &self.dir, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(meta) = self.read_meta(&path).await? {
                    keys.push(meta.key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> AssetSyncResult<()> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                debug!("Deleted cache {}", self.name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err("deleting", &self.dir, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (DiskStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = DiskStore::new(temp.path(), "content");
        (store, temp)
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let (store, _temp) = create_test_store();
        assert!(store.get("https://a.test/x").await.unwrap().is_none());
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn put_get_preserves_status_headers_and_body() {
        let (store, _temp) = create_test_store();
        let response = Response::new(200, vec![0u8, 159, 146, 150])
            .with_header("Content-Type", "application/wasm");

        store.put("https://a.test/app.wasm", &response).await.unwrap();
        let loaded = store.get("https://a.test/app.wasm").await.unwrap().unwrap();

        assert_eq!(loaded, response);
        assert_eq!(loaded.headers.get("content-type").unwrap(), "application/wasm");
    }

    #[tokio::test]
    async fn keys_survive_reopen() {
        let (store, temp) = create_test_store();
        store.put("https://a.test/b", &Response::new(200, "b")).await.unwrap();
        store.put("https://a.test/a", &Response::new(200, "a")).await.unwrap();

        let reopened = DiskStore::new(temp.path(), "content");
        assert_eq!(
            reopened.keys().await.unwrap(),
            vec!["https://a.test/a".to_string(), "https://a.test/b".to_string()]
        );
    }

    #[tokio::test]
    async fn delete_removes_both_files() {
        let (store, _temp) = create_test_store();
        store.put("k", &Response::new(200, "v")).await.unwrap();

        assert!(store.delete("k").await.unwrap());
        assert!(!store.meta_path("k").exists());
        assert!(!store.body_path("k").exists());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn clear_removes_directory() {
        let (store, _temp) = create_test_store();
        store.put("k", &Response::new(200, "v")).await.unwrap();

        store.clear().await.unwrap();
        assert!(!store.dir().exists());
        // Clearing twice is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn missing_payload_is_corrupt() {
        let (store, _temp) = create_test_store();
        store.put("k", &Response::new(200, "v")).await.unwrap();
        std::fs::remove_file(store.body_path("k")).unwrap();

        let err = store.get("k").await.unwrap_err();
        assert!(matches!(err, AssetSyncError::CorruptRecord { .. }));
    }

    #[tokio::test]
    async fn put_leaves_no_temp_files() {
        let (store, _temp) = create_test_store();
        store.put("k", &Response::new(200, "v1")).await.unwrap();
        store.put("k", &Response::new(404, "v2")).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);

        let loaded = store.get("k").await.unwrap().unwrap();
        assert_eq!(loaded.status, 404);
        assert_eq!(loaded.body, b"v2");
    }

    #[tokio::test]
    async fn interrupted_overwrite_hides_entry() {
        let (store, _temp) = create_test_store();
        store
            .put("k", &Response::new(200, "old").with_header("etag", "a"))
            .await
            .unwrap();

        // Overwrite stopped after the payload, before the metadata
        store.remove_if_exists(&store.meta_path("k")).await.unwrap();
        store
            .write_atomic(&store.body_path("k"), b"new")
            .await
            .unwrap();

        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stores_are_isolated_by_name() {
        let temp = TempDir::new().unwrap();
        let content = DiskStore::new(temp.path(), "content");
        let staging = DiskStore::new(temp.path(), "staging");

        staging.put("k", &Response::new(200, "v")).await.unwrap();
        assert!(content.get("k").await.unwrap().is_none());

        staging.clear().await.unwrap();
        assert!(temp.path().exists());
    }
}
