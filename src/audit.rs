//! Audit trail of cache lifecycle events
//!
//! Appends JSON lines to `audit.log` in the state directory: one line per
//! install, activation, reset and offline download, so a deployment's cache
//! history can be reconstructed after the fact.

use crate::config::{schema::Config, ConfigManager};
use chrono::Utc;
use serde_json::json;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Event names written to the audit log
pub mod events {
    pub const INSTALLED: &str = "cache.installed";
    pub const INSTALL_FAILED: &str = "cache.install_failed";
    pub const ACTIVATED: &str = "cache.activated";
    pub const RESET: &str = "cache.reset";
    pub const OFFLINE_DOWNLOADED: &str = "cache.offline_downloaded";
}

/// File-based audit logger that appends JSON lines
pub struct AuditLog {
    enabled: bool,
    path: PathBuf,
}

impl AuditLog {
    /// Create a new audit logger from config
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.audit_log,
            path: ConfigManager::audit_log_path(),
        }
    }

    /// Create a logger writing to an explicit path
    pub fn with_path(path: PathBuf, enabled: bool) -> Self {
        Self { enabled, path }
    }

    /// Log an event with the origin it concerns.
    ///
    /// IO failures are only warned about; auditing never fails a lifecycle event.
    pub async fn log(&self, event: &str, origin: &str, data: serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event,
            "origin": origin,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize audit event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write audit log: {}", e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_audit_log(dir: &TempDir, enabled: bool) -> AuditLog {
        AuditLog::with_path(dir.path().join("state/audit.log"), enabled)
    }

    #[tokio::test]
    async fn writes_json_line() {
        let dir = TempDir::new().unwrap();
        let audit = test_audit_log(&dir, true);

        audit
            .log(
                events::ACTIVATED,
                "https://app.test",
                json!({"kind": "upgrade", "evicted": 3}),
            )
            .await;

        let content = tokio::fs::read_to_string(&audit.path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();

        assert_eq!(parsed["event"], "cache.activated");
        assert_eq!(parsed["origin"], "https://app.test");
        assert_eq!(parsed["data"]["evicted"], 3);
        assert!(parsed["timestamp"].is_string());
    }

    #[tokio::test]
    async fn appends_multiple_lines() {
        let dir = TempDir::new().unwrap();
        let audit = test_audit_log(&dir, true);

        audit.log(events::INSTALLED, "https://app.test", json!({})).await;
        audit.log(events::RESET, "https://app.test", json!({})).await;

        let content = tokio::fs::read_to_string(&audit.path).await.unwrap();
        assert_eq!(content.trim().lines().count(), 2);
    }

    #[tokio::test]
    async fn skips_when_disabled() {
        let dir = TempDir::new().unwrap();
        let audit = test_audit_log(&dir, false);

        audit.log(events::INSTALLED, "https://app.test", json!({})).await;

        assert!(!audit.path.exists());
    }
}
