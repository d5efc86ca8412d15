//! Interception cache manager: provisioning and garbage collection

use super::lifecycle::{Transition, WorkerState};
use crate::config::schema::NotificationConfig;
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use crate::host::Host;
use crate::http::{RequestDescriptor, ResponseType, Scope};
use crate::network::Fetcher;
use crate::storage::CacheStorage;
use crate::sync::SyncRegistry;
use futures_util::future::{join_all, try_join_all};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome of garbage-collecting stale buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    /// Stale buckets removed
    pub deleted: Vec<String>,
    /// Stale buckets whose deletion failed (not retried)
    pub failed: Vec<String>,
}

/// Owns the current version's bucket and runs its lifecycle
pub struct CacheManager {
    pub(super) version: String,
    pub(super) scope: Scope,
    pub(super) precache: Vec<RequestDescriptor>,
    pub(super) fallback: RequestDescriptor,
    pub(super) notifications: NotificationConfig,
    pub(super) storage: Arc<dyn CacheStorage>,
    pub(super) fetcher: Arc<dyn Fetcher>,
    pub(super) host: Arc<dyn Host>,
    pub(super) sync: SyncRegistry,
    state: Mutex<WorkerState>,
    pending_writes: Mutex<JoinSet<()>>,
}

impl CacheManager {
    /// Build a manager from configuration and its collaborators
    pub fn from_config(
        config: &Config,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        host: Arc<dyn Host>,
    ) -> CacheResult<Self> {
        let scope = Scope::parse(&config.cache.scope)?;
        let precache = config
            .cache
            .precache
            .iter()
            .map(|url| scope.request(url))
            .collect::<CacheResult<Vec<_>>>()?;
        let fallback = scope.request(&config.cache.fallback)?;

        Ok(Self {
            version: config.cache.version.clone(),
            scope,
            precache,
            fallback,
            notifications: config.notification.clone(),
            storage,
            fetcher,
            host,
            sync: SyncRegistry::with_defaults(),
            state: Mutex::new(WorkerState::Uninitialized),
            pending_writes: Mutex::new(JoinSet::new()),
        })
    }

    /// Start from a known lifecycle state (e.g. restored from the registration)
    pub fn with_state(self, state: WorkerState) -> Self {
        *self.lock_state() = state;
        self
    }

    /// Replace the sync tag table
    pub fn with_sync_registry(mut self, registry: SyncRegistry) -> Self {
        self.sync = registry;
        self
    }

    /// Version tag naming the current bucket
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn sync_registry(&self) -> &SyncRegistry {
        &self.sync
    }

    pub fn state(&self) -> WorkerState {
        *self.lock_state()
    }

    fn lock_state(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn lock_writes(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.pending_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, transition: Transition) -> CacheResult<WorkerState> {
        let mut state = self.lock_state();
        let next = state.next(transition)?;
        debug!("{}: {} -> {}", self.version, *state, next);
        *state = next;
        Ok(next)
    }

    /// Provision the current bucket with every essential URL
    ///
    /// All-or-nothing: a single failed fetch or non-ok response fails the
    /// install and leaves no new entries behind.
    pub async fn install(&self) -> CacheResult<()> {
        self.transition(Transition::Install)?;
        info!("Installing {}", self.version);

        match self.provision().await {
            Ok(count) => {
                self.transition(Transition::Provisioned)?;
                info!("Cached {} essential resources in {}", count, self.version);
                self.host.skip_waiting(&self.version).await
            }
            Err(e) => {
                self.transition(Transition::ProvisioningFailed)?;
                warn!("Install of {} failed: {}", self.version, e);
                Err(e)
            }
        }
    }

    async fn provision(&self) -> CacheResult<usize> {
        let bucket = self.storage.open(&self.version).await?;

        let fetches = self.precache.iter().map(|request| async move {
            let url = request.url().to_string();
            let response = self
                .fetcher
                .fetch(request)
                .await
                .map_err(|e| CacheError::Provisioning {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;

            if !response.ok() || response.kind() == ResponseType::Opaque {
                return Err(CacheError::Provisioning {
                    url,
                    reason: format!("status {} ({})", response.status(), response.kind()),
                });
            }
            Ok((request, response))
        });
        let responses = try_join_all(fetches).await?;

        let mut stored: Vec<&RequestDescriptor> = Vec::with_capacity(responses.len());
        for (request, response) in responses {
            if let Err(e) = bucket.put(request, response).await {
                for written in &stored {
                    if let Err(rollback) = bucket.delete(written).await {
                        warn!("Failed to roll back {}: {}", written, rollback);
                    }
                }
                return Err(CacheError::Provisioning {
                    url: request.url().to_string(),
                    reason: e.to_string(),
                });
            }
            stored.push(request);
        }

        Ok(stored.len())
    }

    /// Delete every bucket except the current one, then claim all clients
    ///
    /// Deletions run concurrently. A failed deletion is logged and reported
    /// but neither retried nor allowed to block activation.
    pub async fn activate(&self) -> CacheResult<ActivationReport> {
        let state = self.state();
        if !state.is_active() {
            return Err(CacheError::InvalidState {
                action: "activate".to_string(),
                state: state.to_string(),
            });
        }
        info!("Activating {}", self.version);

        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != &self.version)
            .collect();

        let deletions = stale.iter().map(|name| async move {
            info!("Deleting stale bucket {}", name);
            (name, self.storage.delete(name).await)
        });

        let mut report = ActivationReport::default();
        for (name, result) in join_all(deletions).await {
            match result {
                Ok(true) => report.deleted.push(name.clone()),
                Ok(false) => debug!("Bucket {} already gone", name),
                Err(e) => {
                    warn!("Failed to delete stale bucket {}: {}", name, e);
                    report.failed.push(name.clone());
                }
            }
        }

        self.host.claim_clients(&self.version).await?;
        Ok(report)
    }

    /// Mark this version as replaced by a newer one
    pub fn supersede(&self) -> CacheResult<()> {
        self.transition(Transition::Supersede)?;
        info!("{} superseded", self.version);
        Ok(())
    }

    /// Wait for detached cache writes started by request resolution
    ///
    /// Resolution never waits for these; a host that is about to exit does.
    pub async fn flush_pending(&self) {
        let mut tasks = std::mem::take(&mut *self.lock_writes());
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!("Cache write task failed: {}", e);
            }
        }
    }
}
