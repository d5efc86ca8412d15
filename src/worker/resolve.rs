//! Per-request resolution: cache first, then network, then fallback document

use super::manager::CacheManager;
use crate::error::{CacheError, CacheResult};
use crate::http::{RequestDescriptor, Response};
use std::fmt;
use tracing::{debug, info, warn};

/// Where a resolved response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Stored entry in any bucket
    Cache,
    /// Network response, possibly also written to the current bucket
    Network,
    /// Cached fallback document served after a failure
    Fallback,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Network => write!(f, "network"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// A response delivered to the caller
#[derive(Debug)]
pub struct Resolution {
    pub response: Response,
    pub source: ResolutionSource,
}

impl Resolution {
    fn new(response: Response, source: ResolutionSource) -> Self {
        Self { response, source }
    }
}

impl CacheManager {
    /// Resolve an intercepted request
    ///
    /// Any failure on the way (lookup, network, clone) is answered with the
    /// cached fallback document, whatever kind of resource was requested.
    /// Only when the fallback is missing too does resolution fail.
    pub async fn resolve(&self, request: &RequestDescriptor) -> CacheResult<Resolution> {
        match self.cache_then_network(request).await {
            Ok(resolution) => Ok(resolution),
            Err(e) => {
                if e.is_recoverable() {
                    debug!("Resolving {} failed: {}", request, e);
                } else {
                    warn!("Resolving {} failed: {}", request, e);
                }
                self.fallback_for(request).await
            }
        }
    }

    async fn cache_then_network(&self, request: &RequestDescriptor) -> CacheResult<Resolution> {
        if let Some(response) = self.storage.match_request(request).await? {
            debug!("Cache hit {}", request);
            return Ok(Resolution::new(response, ResolutionSource::Cache));
        }

        let response = self.fetcher.fetch(request).await?;
        if !response.is_cacheable() {
            debug!(
                "Not caching {} ({} {})",
                request,
                response.status(),
                response.kind()
            );
            return Ok(Resolution::new(response, ResolutionSource::Network));
        }

        let copy = response.try_clone()?;
        self.spawn_write(request.clone(), copy);
        Ok(Resolution::new(response, ResolutionSource::Network))
    }

    /// Write `response` to the current bucket without the caller waiting
    fn spawn_write(&self, request: RequestDescriptor, response: Response) {
        let storage = self.storage.clone();
        let version = self.version.clone();

        let mut tasks = self.lock_writes();
        // Reap finished writes so the set does not grow without bound
        while tasks.try_join_next().is_some() {}

        tasks.spawn(async move {
            let result: CacheResult<()> = async {
                let bucket = storage.open(&version).await?;
                bucket.put(&request, response).await
            }
            .await;

            match result {
                Ok(()) => debug!("Stored {} in {}", request, version),
                Err(e) => debug!("Dropped cache write for {}: {}", request, e),
            }
        });
    }

    async fn fallback_for(&self, request: &RequestDescriptor) -> CacheResult<Resolution> {
        let no_response = || CacheError::NoResponse {
            url: request.url().to_string(),
        };

        match self.storage.match_request(&self.fallback).await {
            Ok(Some(response)) => {
                info!("Serving fallback {} for {}", self.fallback.url(), request);
                Ok(Resolution::new(response, ResolutionSource::Fallback))
            }
            Ok(None) => Err(no_response()),
            Err(e) => {
                warn!("Fallback lookup failed: {}", e);
                Err(no_response())
            }
        }
    }
}
