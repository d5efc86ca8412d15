//! Status command - lifecycle and bucket summary

use crate::config::{Config, ConfigManager};
use crate::error::CacheResult;
use crate::storage::{CacheStorage, DiskStorage};
use crate::worker::{Registration, WorkerState};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[MISSING] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(config: &Config) -> CacheResult<()> {
    let version = &config.cache.version;
    let storage_dir = ConfigManager::storage_dir(config);
    let registration = Registration::load(&ConfigManager::registration_path(config)).await?;
    let storage = DiskStorage::open_root(&storage_dir).await?;

    println!("{}", style("intercache status").bold().cyan());
    println!();

    println!("{}", style("Version:").bold());
    println!("  Current: {}", style(version).cyan());
    println!("  State:   {}", registration.state_of(version));
    println!("  Scope:   {}", config.cache.scope);
    println!("  Storage: {}", storage_dir.display());

    println!();
    println!("{}", style("Registration:").bold());
    match &registration.active {
        Some(record) => println!(
            "  Active:    {} (since {})",
            record.version,
            record.at.format("%Y-%m-%d %H:%M")
        ),
        None => println!("  Active:    {}", style("none").dim()),
    }
    if let Some(record) = &registration.installed {
        println!("  Installed: {} (waiting to activate)", record.version);
    }
    for record in &registration.superseded {
        println!("  Superseded: {}", style(&record.version).dim());
    }

    println!();
    println!("{}", style("Buckets:").bold());
    let names = storage.keys().await?;
    if names.iter().any(|name| name == version) {
        println!("  {}{} present", CHECK, version);
    } else {
        println!(
            "  {}{} not provisioned - run {}",
            CROSS,
            version,
            style("intercache install").cyan()
        );
    }

    let stale = names.iter().filter(|name| *name != version).count();
    if stale > 0 {
        let hint = if registration.state_of(version) == WorkerState::Active {
            "run intercache activate to remove"
        } else {
            "removed on activation"
        };
        println!("  {}{} stale bucket(s), {}", WARN, stale, hint);
    }

    Ok(())
}
