//! Version lifecycle state machine
//!
//! | State | Meaning |
//! |-------|---------|
//! | Uninitialized | Nothing provisioned for this version |
//! | Provisioning | Install in progress |
//! | Active | Bucket provisioned; serving and eligible to garbage-collect |
//! | Superseded | A newer version activated and removed this bucket |

use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Uninitialized,
    Provisioning,
    Active,
    Superseded,
}

/// Events that move a version through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Install,
    Provisioned,
    ProvisioningFailed,
    Supersede,
}

impl WorkerState {
    /// Apply `transition`, rejecting moves the lifecycle does not allow
    pub fn next(self, transition: Transition) -> CacheResult<Self> {
        use Transition::*;
        use WorkerState::*;

        match (self, transition) {
            (Uninitialized, Install) => Ok(Provisioning),
            (Provisioning, Provisioned) => Ok(Active),
            // Back to the start so the host can retry the install
            (Provisioning, ProvisioningFailed) => Ok(Uninitialized),
            (Active, Supersede) => Ok(Superseded),
            (state, transition) => Err(CacheError::InvalidState {
                action: transition.to_string(),
                state: state.to_string(),
            }),
        }
    }

    /// Whether this version's bucket is eligible to serve and garbage-collect
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Provisioning => write!(f, "provisioning"),
            Self::Active => write!(f, "active"),
            Self::Superseded => write!(f, "superseded"),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Provisioned => write!(f, "complete provisioning"),
            Self::ProvisioningFailed => write!(f, "abort provisioning"),
            Self::Supersede => write!(f, "supersede"),
        }
    }
}
