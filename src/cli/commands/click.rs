//! Click command - react to a notification click

use super::open_manager;
use crate::cli::args::ClickArgs;
use crate::config::Config;
use crate::error::CacheResult;
use crate::worker::{Event, WorkerState};
use uuid::Uuid;

/// Execute the click command
pub async fn execute(args: ClickArgs, config: &Config) -> CacheResult<()> {
    let manager = open_manager(config, WorkerState::Uninitialized).await?;
    let notification = args.id.unwrap_or_else(Uuid::new_v4);

    manager
        .dispatch(Event::NotificationClick { notification })
        .wait()
        .await?;
    Ok(())
}
