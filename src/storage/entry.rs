//! Stored request/response snapshots

use crate::http::{Headers, RequestDescriptor, Response, ResponseType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A response snapshot plus the request facts needed to match it again
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Canonical request key (`"GET http://..."`)
    pub key: String,

    /// Request URL
    pub url: String,

    /// Request header values named by the response's `Vary` header
    pub vary: Headers,

    /// The stored response
    pub response: StoredResponse,

    /// When the entry was written
    pub stored_at: DateTime<Utc>,
}

/// Immutable response snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    pub status: u16,
    pub kind: ResponseType,
    pub url: Option<String>,
    pub headers: Headers,
    /// Body bytes; persisted separately by the disk store
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl StoredEntry {
    /// Snapshot `response` for `request`, consuming the response body
    pub fn capture(request: &RequestDescriptor, mut response: Response) -> crate::CacheResult<Self> {
        let body = response.bytes()?;

        let mut vary = Headers::new();
        for name in response.headers().vary_names() {
            if name == "*" {
                vary.insert("*", "*");
                continue;
            }
            if let Some(value) = request.headers().get(&name) {
                vary.insert(&name, value);
            } else {
                vary.insert(&name, "");
            }
        }

        Ok(Self {
            key: request.cache_key(),
            url: request.url().to_string(),
            vary,
            response: StoredResponse {
                status: response.status(),
                kind: response.kind(),
                url: response.url().map(str::to_string),
                headers: response.headers().clone(),
                body,
            },
            stored_at: Utc::now(),
        })
    }

    /// Whether this entry answers `request`, honoring `Vary`
    pub fn matches(&self, request: &RequestDescriptor) -> bool {
        if !request.is_get() || self.key != request.cache_key() {
            return false;
        }

        self.vary.iter().all(|(name, stored)| {
            name != "*" && request.headers().get(name).unwrap_or("") == stored
        })
    }

    /// Produce a fresh response from the snapshot
    pub fn to_response(&self) -> Response {
        let stored = &self.response;
        let mut response = Response::new(stored.status, stored.kind, stored.body.clone())
            .with_headers(stored.headers.clone());
        if let Some(url) = &stored.url {
            response = response.with_url(url.clone());
        }
        response
    }
}
