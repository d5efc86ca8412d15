//! Error types for intercache
//!
//! All modules use `CacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for intercache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur in intercache
#[derive(Error, Debug)]
pub enum CacheError {
    // Lifecycle errors
    #[error("Provisioning failed for {url}: {reason}")]
    Provisioning { url: String, reason: String },

    #[error("Failed to delete stale bucket {name}: {reason}")]
    BucketDelete { name: String, reason: String },

    #[error("Invalid lifecycle transition: cannot {action} while {state}")]
    InvalidState { action: String, state: String },

    // Request resolution errors
    #[error("Network request failed for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("No response available for {url}")]
    NoResponse { url: String },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Response body already used")]
    BodyUsed,

    // Storage errors
    #[error("Only GET requests can be cached, got {0}")]
    UnsupportedMethod(String),

    #[error("Bucket {0} was deleted")]
    BucketDeleted(String),

    #[error("Cache storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a storage error
    pub fn storage(reason: impl Into<String>) -> Self {
        Self::Storage(reason.into())
    }

    /// Whether request resolution recovers from this error with the fallback document
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Storage(_) | Self::Io { .. } | Self::BodyUsed
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Provisioning { .. } => {
                Some("Check that every URL in cache.precache is reachable, then run: intercache install")
            }
            Self::NoResponse { .. } => Some("Run `intercache install` while online to cache the fallback page"),
            Self::InvalidState { .. } => Some("Run `intercache status` to inspect the lifecycle state"),
            Self::ConfigInvalid { .. } => Some("Run: intercache config init --force"),
            _ => None,
        }
    }
}
