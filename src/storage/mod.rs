//! Versioned cache buckets
//!
//! A [`CacheStorage`] holds named [`Bucket`]s; each bucket maps a canonical
//! request key to a stored response snapshot. The interception logic only
//! sees these traits, so the same policy runs against the in-memory store
//! (tests, embedding) and the on-disk store (CLI host).
//!
//! # Layout on disk
//!
//! | Path | Content |
//! |------|---------|
//! | `index.json` | Bucket names in creation order |
//! | `<sha256(name)>/<sha256(key)>.json` | Entry metadata |
//! | `<sha256(name)>/<sha256(key)>.<id>.body` | Entry body |

mod disk;
mod entry;
mod memory;

pub use disk::DiskStorage;
pub use entry::{StoredEntry, StoredResponse};
pub use memory::MemoryStorage;

use crate::error::{CacheError, CacheResult};
use crate::http::{RequestDescriptor, Response};
use async_trait::async_trait;
use std::sync::Arc;

/// A single named bucket of request/response pairs
#[async_trait]
pub trait Bucket: Send + Sync {
    /// Bucket name (the version tag that created it)
    fn name(&self) -> &str;

    /// Look up a stored response for `request`
    async fn match_request(&self, request: &RequestDescriptor) -> CacheResult<Option<Response>>;

    /// Store `response` under `request`, replacing any previous entry.
    /// Consumes the response body.
    async fn put(&self, request: &RequestDescriptor, response: Response) -> CacheResult<()>;

    /// Remove the entry for `request`, returning whether one existed
    async fn delete(&self, request: &RequestDescriptor) -> CacheResult<bool>;

    /// Canonical keys of all stored entries
    async fn keys(&self) -> CacheResult<Vec<String>>;
}

/// Registry of named buckets
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the bucket called `name`, creating it if needed
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn Bucket>>;

    /// Open the bucket called `name` only if it exists
    async fn open_existing(&self, name: &str) -> CacheResult<Option<Arc<dyn Bucket>>>;

    /// Whether a bucket called `name` exists
    async fn has(&self, name: &str) -> CacheResult<bool> {
        Ok(self.open_existing(name).await?.is_some())
    }

    /// Bucket names in creation order
    async fn keys(&self) -> CacheResult<Vec<String>>;

    /// Delete a bucket, returning whether it existed
    async fn delete(&self, name: &str) -> CacheResult<bool>;

    /// Look up `request` in every bucket, oldest first, returning the first hit
    async fn match_request(&self, request: &RequestDescriptor) -> CacheResult<Option<Response>> {
        for name in self.keys().await? {
            // A bucket may vanish between listing and opening; skip it.
            let Some(bucket) = self.open_existing(&name).await? else {
                continue;
            };
            if let Some(response) = bucket.match_request(request).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

/// Reject requests that cannot be stored
pub(crate) fn ensure_storable(request: &RequestDescriptor) -> CacheResult<()> {
    if request.is_get() {
        Ok(())
    } else {
        Err(CacheError::UnsupportedMethod(request.method().to_string()))
    }
}
