//! Deferred background synchronization
//!
//! Sync events carry a tag; the registry maps tags to tasks. Unknown tags
//! are ignored.

use crate::error::CacheResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Tag used by the application for inventory synchronization
pub const INVENTORY_SYNC_TAG: &str = "sync-inventory";

/// A unit of deferred work run when its sync tag fires
#[async_trait]
pub trait SyncTask: Send + Sync {
    async fn run(&self) -> CacheResult<()>;
}

/// Placeholder for inventory synchronization with the remote server
pub struct InventorySync;

#[async_trait]
impl SyncTask for InventorySync {
    async fn run(&self) -> CacheResult<()> {
        info!("Synchronizing inventory data");
        Ok(())
    }
}

/// Sync tag dispatch table
#[derive(Clone, Default)]
pub struct SyncRegistry {
    tasks: HashMap<String, Arc<dyn SyncTask>>,
}

impl SyncRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the inventory task under [`INVENTORY_SYNC_TAG`]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(INVENTORY_SYNC_TAG, Arc::new(InventorySync));
        registry
    }

    pub fn register(&mut self, tag: &str, task: Arc<dyn SyncTask>) {
        self.tasks.insert(tag.to_string(), task);
    }

    pub fn get(&self, tag: &str) -> Option<Arc<dyn SyncTask>> {
        self.tasks.get(tag).cloned()
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tasks.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}
