//! Sync command - run a background sync task by tag

use super::open_manager;
use crate::cli::args::SyncArgs;
use crate::config::Config;
use crate::error::CacheResult;
use crate::worker::{Event, EventOutcome, WorkerState};
use console::style;

/// Execute the sync command
pub async fn execute(args: SyncArgs, config: &Config) -> CacheResult<()> {
    let manager = open_manager(config, WorkerState::Uninitialized).await?;

    let waiter = manager.dispatch(Event::Sync {
        tag: args.tag.clone(),
    });
    if !waiter.is_pending() {
        println!(
            "{} No sync task registered for {}",
            style("-").dim(),
            style(&args.tag).yellow()
        );
        println!(
            "  Known tags: {}",
            manager.sync_registry().tags().join(", ")
        );
        return Ok(());
    }

    if let EventOutcome::Synced(tag) = waiter.wait().await? {
        println!("{} Sync {} complete", style("✓").green(), style(tag).cyan());
    }
    Ok(())
}
