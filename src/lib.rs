//! intercache - Request-intercepting offline cache
//!
//! Serves intercepted requests from versioned cache buckets, falls back to
//! the network while opportunistically storing successful responses, and
//! answers with an offline page when neither is available.

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod http;
pub mod network;
pub mod notify;
pub mod storage;
pub mod sync;
pub mod worker;

#[cfg(test)]
mod testing;

pub use error::{CacheError, CacheResult};
