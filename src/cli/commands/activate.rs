//! Activate command - remove stale buckets and claim all clients

use super::open_registered;
use crate::audit::AuditLog;
use crate::config::{Config, ConfigManager};
use crate::error::{CacheError, CacheResult};
use crate::worker::{Event, EventOutcome};
use console::style;

/// Execute the activate command
pub async fn execute(config: &Config) -> CacheResult<()> {
    let (manager, mut registration) = open_registered(config).await?;
    let version = manager.version().to_string();

    let report = match manager.dispatch(Event::Activate).wait().await? {
        EventOutcome::Activated(report) => report,
        other => {
            return Err(CacheError::Internal(format!(
                "unexpected activate outcome: {:?}",
                other
            )))
        }
    };

    let replaced = registration.record_activation(&version);
    registration
        .save(&ConfigManager::registration_path(config))
        .await?;
    AuditLog::new(config).activated(&version, &report).await;

    for name in &report.deleted {
        println!("  {} Deleted {}", style("-").red(), name);
    }
    for name in &report.failed {
        println!(
            "  {} Could not delete {} (left in place)",
            style("!").yellow(),
            name
        );
    }
    if let Some(previous) = replaced {
        println!("  {} superseded", style(previous).dim());
    }

    println!(
        "{} {} is active ({} stale bucket(s) removed)",
        style("✓").green(),
        style(&version).cyan(),
        report.deleted.len()
    );
    Ok(())
}
