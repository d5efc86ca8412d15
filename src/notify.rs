//! Push notification formatting
//!
//! Push payloads are JSON objects with optional `title` and `body` fields.
//! Anything else (no data, empty data, invalid JSON, non-object JSON)
//! falls back to the configured defaults; building a notification never fails.

use crate::config::schema::NotificationConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw data delivered with a push message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushPayload(Option<Vec<u8>>);

impl PushPayload {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self(Some(data.into()))
    }

    /// Parse the payload as JSON, if it is JSON
    fn json(&self) -> serde_json::Value {
        self.0
            .as_deref()
            .filter(|data| !data.is_empty())
            .and_then(|data| serde_json::from_slice(data).ok())
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()))
    }
}

/// A notification ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    /// The parsed push payload, passed through untouched
    pub data: serde_json::Value,
}

fn text_field(data: &serde_json::Value, field: &str) -> Option<String> {
    data.get(field)
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build the notification shown for a push message
pub fn build_notification(payload: &PushPayload, config: &NotificationConfig) -> Notification {
    let data = payload.json();

    Notification {
        id: Uuid::new_v4(),
        title: text_field(&data, "title").unwrap_or_else(|| config.default_title.clone()),
        body: text_field(&data, "body").unwrap_or_else(|| config.default_body.clone()),
        icon: config.icon.clone(),
        badge: config.badge.clone(),
        vibrate: config.vibrate.clone(),
        data,
    }
}
