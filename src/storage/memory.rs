//! In-process bucket storage

use super::{ensure_storable, Bucket, CacheStorage, StoredEntry};
use crate::error::{CacheError, CacheResult};
use crate::http::{RequestDescriptor, Response};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Bucket storage that lives for the lifetime of the process
#[derive(Default)]
pub struct MemoryStorage {
    buckets: RwLock<Vec<Arc<MemoryBucket>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn Bucket>> {
        let mut buckets = self.buckets.write().await;
        if let Some(bucket) = buckets.iter().find(|b| b.name == name) {
            return Ok(bucket.clone());
        }

        let bucket = Arc::new(MemoryBucket::new(name));
        buckets.push(bucket.clone());
        Ok(bucket)
    }

    async fn open_existing(&self, name: &str) -> CacheResult<Option<Arc<dyn Bucket>>> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.clone() as Arc<dyn Bucket>))
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        let buckets = self.buckets.read().await;
        Ok(buckets.iter().map(|b| b.name.clone()).collect())
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let mut buckets = self.buckets.write().await;
        let Some(index) = buckets.iter().position(|b| b.name == name) else {
            return Ok(false);
        };
        let bucket = buckets.remove(index);
        bucket.deleted.store(true, Ordering::SeqCst);
        Ok(true)
    }
}

/// Bucket whose entries are kept in insertion order
pub struct MemoryBucket {
    name: String,
    entries: RwLock<Vec<StoredEntry>>,
    deleted: AtomicBool,
}

impl MemoryBucket {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: RwLock::new(Vec::new()),
            deleted: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Bucket for MemoryBucket {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &RequestDescriptor) -> CacheResult<Option<Response>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .find(|entry| entry.matches(request))
            .map(StoredEntry::to_response))
    }

    async fn put(&self, request: &RequestDescriptor, response: Response) -> CacheResult<()> {
        ensure_storable(request)?;
        if self.deleted.load(Ordering::SeqCst) {
            return Err(CacheError::BucketDeleted(self.name.clone()));
        }

        let entry = StoredEntry::capture(request, response)?;
        let mut entries = self.entries.write().await;
        entries.retain(|existing| existing.key != entry.key);
        entries.push(entry);
        Ok(())
    }

    async fn delete(&self, request: &RequestDescriptor) -> CacheResult<bool> {
        let key = request.cache_key();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|entry| entry.key != key);
        Ok(entries.len() != before)
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().map(|entry| entry.key.clone()).collect())
    }
}
