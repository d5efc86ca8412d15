//! CLI command implementations

pub mod activate;
pub mod buckets;
pub mod click;
pub mod config;
pub mod fetch;
pub mod install;
pub mod push;
pub mod status;
pub mod sync;

pub use activate::execute as activate;
pub use buckets::execute as buckets;
pub use click::execute as click;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use push::execute as push;
pub use status::execute as status;
pub use sync::execute as sync;

use crate::config::{Config, ConfigManager};
use crate::error::CacheResult;
use crate::host::ConsoleHost;
use crate::http::Scope;
use crate::network::HttpFetcher;
use crate::storage::DiskStorage;
use crate::worker::{CacheManager, Registration, WorkerState};
use std::sync::Arc;
use std::time::Duration;

/// Build a cache manager over the on-disk buckets and the real network
pub(crate) async fn open_manager(
    config: &Config,
    state: WorkerState,
) -> CacheResult<Arc<CacheManager>> {
    let storage = DiskStorage::open_root(ConfigManager::storage_dir(config)).await?;
    let fetcher = HttpFetcher::new(
        Scope::parse(&config.cache.scope)?,
        Duration::from_secs(config.cache.timeout_secs),
    );

    let manager = CacheManager::from_config(
        config,
        Arc::new(storage),
        Arc::new(fetcher),
        Arc::new(ConsoleHost),
    )?
    .with_state(state);

    Ok(Arc::new(manager))
}

/// Build a cache manager in the lifecycle state the registration records
pub(crate) async fn open_registered(
    config: &Config,
) -> CacheResult<(Arc<CacheManager>, Registration)> {
    let registration = Registration::load(&ConfigManager::registration_path(config)).await?;
    let state = registration.state_of(&config.cache.version);
    let manager = open_manager(config, state).await?;
    Ok((manager, registration))
}
