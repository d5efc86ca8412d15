//! The interception cache manager
//!
//! One manager owns one version tag and the bucket of the same name.
//!
//! - **install** provisions the bucket with the essential URLs, all or nothing
//! - **activate** deletes every other bucket and claims open clients
//! - **fetch** answers from any bucket, else from the network (storing
//!   successful same-origin responses), else with the fallback document

mod events;
mod lifecycle;
mod manager;
mod registration;
mod resolve;

pub use events::{Event, EventOutcome, WaitUntil};
pub use lifecycle::{Transition, WorkerState};
pub use manager::{ActivationReport, CacheManager};
pub use registration::{Registration, VersionRecord};
pub use resolve::{Resolution, ResolutionSource};
