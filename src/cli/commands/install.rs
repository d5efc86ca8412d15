//! Install command - provision the current version's bucket

use super::open_manager;
use crate::audit::AuditLog;
use crate::config::{Config, ConfigManager};
use crate::error::CacheResult;
use crate::worker::{Event, Registration, WorkerState};
use console::style;

/// Execute the install command
pub async fn execute(config: &Config) -> CacheResult<()> {
    let registration_path = ConfigManager::registration_path(config);
    let mut registration = Registration::load(&registration_path).await?;
    // Installing a version the registration already knows provisions it again
    let manager = open_manager(config, WorkerState::Uninitialized).await?;
    let version = manager.version().to_string();
    let audit = AuditLog::new(config);

    println!("Installing {}...", style(&version).cyan());

    match manager.dispatch(Event::Install).wait().await {
        Ok(_) => {
            let resources = config.cache.precache.len();
            registration.record_install(&version);
            registration.save(&registration_path).await?;
            audit.installed(&version, resources).await;

            println!(
                "{} Cached {} essential resources in {}",
                style("✓").green(),
                resources,
                style(&version).cyan()
            );
            println!("  Run {} to take over", style("intercache activate").cyan());
            Ok(())
        }
        Err(e) => {
            audit.install_failed(&version, &e).await;
            Err(e)
        }
    }
}
