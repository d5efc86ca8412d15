//! Hosting environment abstraction
//!
//! The cache manager never talks to windows, clients or the notification
//! tray directly. It asks the [`Host`], which lets the same lifecycle logic
//! run under the CLI, an embedding application, or a test double.

use crate::error::CacheResult;
use crate::notify::Notification;
use async_trait::async_trait;
use console::style;
use tracing::info;
use uuid::Uuid;

/// Capabilities the hosting environment provides to the cache manager
#[async_trait]
pub trait Host: Send + Sync {
    /// Let `version` take over without waiting for old instances to be released
    async fn skip_waiting(&self, version: &str) -> CacheResult<()>;

    /// Route all open clients (not just new ones) through `version`
    async fn claim_clients(&self, version: &str) -> CacheResult<()>;

    /// Display a notification
    async fn show_notification(&self, notification: &Notification) -> CacheResult<()>;

    /// Dismiss a displayed notification
    async fn close_notification(&self, id: Uuid) -> CacheResult<()>;

    /// Open or focus a window at `url`
    async fn open_window(&self, url: &str) -> CacheResult<()>;
}

/// Host that renders everything to the terminal
pub struct ConsoleHost;

#[async_trait]
impl Host for ConsoleHost {
    async fn skip_waiting(&self, version: &str) -> CacheResult<()> {
        info!("Version {} is eligible to take over immediately", version);
        Ok(())
    }

    async fn claim_clients(&self, version: &str) -> CacheResult<()> {
        info!("Version {} now controls all clients", version);
        Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> CacheResult<()> {
        println!(
            "{} {}",
            style("🔔").yellow(),
            style(&notification.title).bold()
        );
        println!("   {}", notification.body);
        println!(
            "   {} {}",
            style("id:").dim(),
            style(notification.id).dim()
        );
        Ok(())
    }

    async fn close_notification(&self, id: Uuid) -> CacheResult<()> {
        info!("Closed notification {}", id);
        Ok(())
    }

    async fn open_window(&self, url: &str) -> CacheResult<()> {
        println!("{} Opening window at {}", style("→").cyan(), style(url).cyan());
        Ok(())
    }
}
