//! Lifecycle event dispatch
//!
//! The host delivers one [`Event`] per trigger. [`CacheManager::dispatch`]
//! returns at once with a [`WaitUntil`] handle: the host may keep working
//! and await the handle when it needs the outcome (a fetch response, or the
//! end of an install before treating the version as ready).

use super::manager::{ActivationReport, CacheManager};
use super::resolve::Resolution;
use crate::error::{CacheError, CacheResult};
use crate::http::RequestDescriptor;
use crate::notify::{build_notification, Notification, PushPayload};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// Triggers delivered by the hosting environment
#[derive(Debug)]
pub enum Event {
    Install,
    Activate,
    Fetch(RequestDescriptor),
    Sync { tag: String },
    Push(PushPayload),
    NotificationClick { notification: Uuid },
}

/// What handling an event produced
#[derive(Debug)]
pub enum EventOutcome {
    Installed,
    Activated(ActivationReport),
    Response(Resolution),
    Synced(String),
    NotificationShown(Notification),
    WindowOpened(String),
    /// Nothing registered for this event
    Ignored,
}

/// Hold-open handle for an in-flight event
pub struct WaitUntil {
    handle: Option<JoinHandle<CacheResult<EventOutcome>>>,
}

impl WaitUntil {
    fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = CacheResult<EventOutcome>> + Send + 'static,
    {
        Self {
            handle: Some(tokio::spawn(future)),
        }
    }

    fn ignored() -> Self {
        Self { handle: None }
    }

    /// Whether the host is asked to stay open for this event
    pub fn is_pending(&self) -> bool {
        self.handle.is_some()
    }

    /// Wait for the event to finish
    pub async fn wait(self) -> CacheResult<EventOutcome> {
        match self.handle {
            Some(handle) => handle
                .await
                .map_err(|e| CacheError::Internal(format!("event task failed: {}", e)))?,
            None => Ok(EventOutcome::Ignored),
        }
    }
}

impl CacheManager {
    /// Register intent to handle `event` and start handling it
    ///
    /// Sync events for unregistered tags are ignored without holding the host.
    pub fn dispatch(self: &Arc<Self>, event: Event) -> WaitUntil {
        if let Event::Sync { tag } = &event {
            if self.sync.get(tag).is_none() {
                debug!("No sync task for tag {}", tag);
                return WaitUntil::ignored();
            }
        }

        let manager = Arc::clone(self);
        WaitUntil::spawn(async move { manager.handle(event).await })
    }

    /// Handle `event` to completion on the current task
    pub async fn handle(&self, event: Event) -> CacheResult<EventOutcome> {
        match event {
            Event::Install => {
                self.install().await?;
                Ok(EventOutcome::Installed)
            }
            Event::Activate => Ok(EventOutcome::Activated(self.activate().await?)),
            Event::Fetch(request) => Ok(EventOutcome::Response(self.resolve(&request).await?)),
            Event::Sync { tag } => self.run_sync(tag).await,
            Event::Push(payload) => self.show_push(&payload).await,
            Event::NotificationClick { notification } => self.notification_click(notification).await,
        }
    }

    async fn run_sync(&self, tag: String) -> CacheResult<EventOutcome> {
        let Some(task) = self.sync.get(&tag) else {
            return Ok(EventOutcome::Ignored);
        };

        info!("Running sync task {}", tag);
        task.run().await?;
        Ok(EventOutcome::Synced(tag))
    }

    async fn show_push(&self, payload: &PushPayload) -> CacheResult<EventOutcome> {
        let notification = build_notification(payload, &self.notifications);
        self.host.show_notification(&notification).await?;
        Ok(EventOutcome::NotificationShown(notification))
    }

    async fn notification_click(&self, notification: Uuid) -> CacheResult<EventOutcome> {
        self.host.close_notification(notification).await?;
        let url = self.notifications.click_url.clone();
        self.host.open_window(&url).await?;
        Ok(EventOutcome::WindowOpened(url))
    }
}
