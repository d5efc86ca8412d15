//! Audit logging for cache lifecycle events
//!
//! Writes JSON lines to `~/.local/state/intercache/audit.log`: installs,
//! activations and every stale bucket removed.

use crate::config::{schema::Config, ConfigManager};
use crate::error::CacheError;
use crate::worker::ActivationReport;
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

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

    /// Log an audit event as a JSON line
    ///
    /// Silently drops events on IO failure; the lifecycle step being
    /// audited has already happened.
    pub async fn log(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event,
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

    /// Record a completed install
    pub async fn installed(&self, version: &str, resources: usize) {
        self.log(
            "cache.installed",
            &serde_json::json!({ "version": version, "resources": resources }),
        )
        .await;
    }

    /// Record a failed install
    pub async fn install_failed(&self, version: &str, error: &CacheError) {
        self.log(
            "cache.install_failed",
            &serde_json::json!({ "version": version, "error": error.to_string() }),
        )
        .await;
    }

    /// Record an activation, one line per stale bucket removed
    pub async fn activated(&self, version: &str, report: &ActivationReport) {
        for name in &report.deleted {
            self.log(
                "cache.bucket_deleted",
                &serde_json::json!({ "name": name, "by": version }),
            )
            .await;
        }
        self.log(
            "cache.activated",
            &serde_json::json!({
                "version": version,
                "deleted": report.deleted,
                "failed": report.failed,
            }),
        )
        .await;
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
        AuditLog {
            enabled,
            path: dir.path().join("audit.log"),
        }
    }

    #[tokio::test]
    async fn writes_json_line() {
        let dir = TempDir::new().unwrap();
        let audit = test_audit_log(&dir, true);

        audit
            .log(
                "cache.bucket_deleted",
                &serde_json::json!({"name": "stock-auto-v6"}),
            )
            .await;

        let content = tokio::fs::read_to_string(&audit.path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();

        assert_eq!(parsed["event"], "cache.bucket_deleted");
        assert_eq!(parsed["data"]["name"], "stock-auto-v6");
        assert!(parsed["timestamp"].is_string());
    }

    #[tokio::test]
    async fn appends_multiple_lines() {
        let dir = TempDir::new().unwrap();
        let audit = test_audit_log(&dir, true);

        audit.log("cache.installed", &serde_json::json!({})).await;
        audit.log("cache.activated", &serde_json::json!({})).await;

        let content = tokio::fs::read_to_string(&audit.path).await.unwrap();
        let lines: Vec<&str> = content.trim().lines().collect();
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn activation_logs_each_deleted_bucket() {
        let dir = TempDir::new().unwrap();
        let audit = test_audit_log(&dir, true);
        let report = ActivationReport {
            deleted: vec!["v5".to_string(), "v6".to_string()],
            failed: vec!["v4".to_string()],
        };

        audit.activated("v7", &report).await;

        let content = tokio::fs::read_to_string(&audit.path).await.unwrap();
        let events: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["event"], "cache.bucket_deleted");
        assert_eq!(events[1]["data"]["name"], "v6");
        assert_eq!(events[2]["event"], "cache.activated");
        assert_eq!(events[2]["data"]["failed"][0], "v4");
    }

    #[tokio::test]
    async fn skips_when_disabled() {
        let dir = TempDir::new().unwrap();
        let audit = test_audit_log(&dir, false);

        audit.log("should.not.appear", &serde_json::json!({})).await;

        assert!(!audit.path.exists());
    }
}
