//! Push command - deliver a push message

use super::open_manager;
use crate::cli::args::PushArgs;
use crate::config::Config;
use crate::error::CacheResult;
use crate::notify::PushPayload;
use crate::worker::{Event, WorkerState};

/// Execute the push command
pub async fn execute(args: PushArgs, config: &Config) -> CacheResult<()> {
    let manager = open_manager(config, WorkerState::Uninitialized).await?;

    let payload = match args.data {
        Some(data) => PushPayload::from_bytes(data),
        None => PushPayload::empty(),
    };

    manager.dispatch(Event::Push(payload)).wait().await?;
    Ok(())
}
