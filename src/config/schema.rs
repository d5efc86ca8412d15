//! Configuration schema for intercache
//!
//! Configuration is stored at `~/.config/intercache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache bucket and interception settings
    pub cache: CacheConfig,

    /// Push notification defaults
    pub notification: NotificationConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Version tag naming the current bucket. Bump on every deployment.
    pub version: String,

    /// Base URL that relative request URLs resolve against
    pub scope: String,

    /// Essential URLs stored during install
    pub precache: Vec<String>,

    /// Document served when a request cannot be resolved
    pub fallback: String,

    /// Bucket storage directory (defaults to the state directory)
    pub storage_dir: Option<PathBuf>,

    /// Network timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: "stock-auto-v7".to_string(),
            scope: "http://localhost:8080/".to_string(),
            precache: vec![
                "./".to_string(),
                "./index.html".to_string(),
                "./manifest.json".to_string(),
            ],
            fallback: "./index.html".to_string(),
            storage_dir: None,
            timeout_secs: 30,
        }
    }
}

/// Push notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Title used when the push payload has none
    pub default_title: String,

    /// Body used when the push payload has none
    pub default_body: String,

    /// Notification icon (URL or data URI)
    pub icon: String,

    /// Notification badge (URL or data URI)
    pub badge: String,

    /// Vibration pattern in milliseconds
    pub vibrate: Vec<u32>,

    /// Window opened when a notification is clicked
    pub click_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_title: "Stock Pièces Auto".to_string(),
            default_body: "Nouvelle notification".to_string(),
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_BADGE.to_string(),
            vibrate: vec![200, 100, 200],
            click_url: "/".to_string(),
        }
    }
}

const DEFAULT_ICON: &str = "data:image/svg+xml,%3Csvg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 192 192\"%3E%3Crect width=\"192\" height=\"192\" fill=\"%231e3a8a\"/%3E%3Cpath fill=\"white\" d=\"M96 48L48 72v48l48 24 48-24V72L96 48zm0 16l32 16v32l-32 16-32-16V80l32-16z\"/%3E%3C/svg%3E";

const DEFAULT_BADGE: &str = "data:image/svg+xml,%3Csvg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 96 96\"%3E%3Ccircle cx=\"48\" cy=\"48\" r=\"48\" fill=\"%231e3a8a\"/%3E%3C/svg%3E";
