//! Test doubles for the network, the host and bucket storage

use crate::error::{CacheError, CacheResult};
use crate::host::Host;
use crate::http::{RequestDescriptor, Response, ResponseType};
use crate::network::Fetcher;
use crate::notify::Notification;
use crate::storage::{Bucket, CacheStorage, MemoryStorage};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Clone)]
enum Route {
    Respond {
        status: u16,
        kind: ResponseType,
        body: Vec<u8>,
    },
    Opaque,
}

/// Fetcher answering from a fixed URL table
///
/// Unknown URLs and offline mode fail like a dropped connection.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, Route>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, status: u16, kind: ResponseType, body: &str) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route::Respond {
                status,
                kind,
                body: body.as_bytes().to_vec(),
            },
        );
    }

    pub fn route_opaque(&self, url: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Opaque);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of fetches attempted
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &RequestDescriptor) -> CacheResult<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Suspend like a real network call so concurrent resolutions interleave
        tokio::task::yield_now().await;

        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::network(request.url().as_str(), "offline"));
        }

        let route = self.routes.lock().unwrap().get(request.url().as_str()).cloned();
        match route {
            Some(Route::Respond { status, kind, body }) => {
                Ok(Response::new(status, kind, body).with_url(request.url().as_str()))
            }
            Some(Route::Opaque) => Ok(Response::opaque()),
            None => Err(CacheError::network(
                request.url().as_str(),
                "connection refused",
            )),
        }
    }
}

/// A call made on [`RecordingHost`]
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    SkipWaiting(String),
    ClaimClients(String),
    ShowNotification(Notification),
    CloseNotification(Uuid),
    OpenWindow(String),
}

/// Host that records every call
#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: HostCall) -> CacheResult<()> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn skip_waiting(&self, version: &str) -> CacheResult<()> {
        self.record(HostCall::SkipWaiting(version.to_string()))
    }

    async fn claim_clients(&self, version: &str) -> CacheResult<()> {
        self.record(HostCall::ClaimClients(version.to_string()))
    }

    async fn show_notification(&self, notification: &Notification) -> CacheResult<()> {
        self.record(HostCall::ShowNotification(notification.clone()))
    }

    async fn close_notification(&self, id: Uuid) -> CacheResult<()> {
        self.record(HostCall::CloseNotification(id))
    }

    async fn open_window(&self, url: &str) -> CacheResult<()> {
        self.record(HostCall::OpenWindow(url.to_string()))
    }
}

/// In-memory storage whose deletion of selected buckets always fails
pub struct FlakyStorage {
    inner: MemoryStorage,
    failing: HashSet<String>,
}

impl FlakyStorage {
    pub fn failing_deletes(names: &[&str]) -> Self {
        Self {
            inner: MemoryStorage::new(),
            failing: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn Bucket>> {
        self.inner.open(name).await
    }

    async fn open_existing(&self, name: &str) -> CacheResult<Option<Arc<dyn Bucket>>> {
        self.inner.open_existing(name).await
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        if self.failing.contains(name) {
            return Err(CacheError::BucketDelete {
                name: name.to_string(),
                reason: "permission denied".to_string(),
            });
        }
        self.inner.delete(name).await
    }
}
