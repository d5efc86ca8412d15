//! Persisted record of which versions are installed, active or superseded

use super::lifecycle::WorkerState;
use crate::error::{CacheError, CacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// A version and when it reached its current slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: String,
    pub at: DateTime<Utc>,
}

impl VersionRecord {
    fn now(version: &str) -> Self {
        Self {
            version: version.to_string(),
            at: Utc::now(),
        }
    }
}

/// Registration record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Registration {
    /// Provisioned but not yet activated
    pub installed: Option<VersionRecord>,

    /// Currently serving
    pub active: Option<VersionRecord>,

    /// Replaced versions, oldest first
    pub superseded: Vec<VersionRecord>,
}

impl Registration {
    /// Load the record, or an empty one if none was saved
    pub async fn load(path: &Path) -> CacheResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CacheError::io(format!("reading registration {}", path.display()), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn save(&self, path: &Path) -> CacheResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::io("creating registration directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .map_err(|e| CacheError::io(format!("writing registration {}", path.display()), e))
    }

    /// Record a successful install of `version`
    pub fn record_install(&mut self, version: &str) {
        self.installed = Some(VersionRecord::now(version));
    }

    /// Record activation of `version`, returning the version it replaced
    pub fn record_activation(&mut self, version: &str) -> Option<String> {
        if self.installed.as_ref().is_some_and(|r| r.version == version) {
            self.installed = None;
        }
        self.superseded.retain(|r| r.version != version);

        let previous = self.active.replace(VersionRecord::now(version))?;
        if previous.version == version {
            return None;
        }

        let replaced = previous.version.clone();
        self.superseded.push(VersionRecord {
            version: previous.version,
            at: Utc::now(),
        });
        Some(replaced)
    }

    /// Lifecycle state of `version` according to this record
    pub fn state_of(&self, version: &str) -> WorkerState {
        let is = |record: &Option<VersionRecord>| {
            record.as_ref().is_some_and(|r| r.version == version)
        };

        if is(&self.active) || is(&self.installed) {
            WorkerState::Active
        } else if self.superseded.iter().any(|r| r.version == version) {
            WorkerState::Superseded
        } else {
            WorkerState::Uninitialized
        }
    }
}
